// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory per-item locks backed by lock files.
//!
//! A lock is a file `locks/<item_id>.lock` created with `O_EXCL`
//! semantics, so two acquirers can never both succeed. A lock is only
//! binding while it is younger than the TTL; an older one is treated as
//! abandoned by a crashed holder and may be reclaimed by anyone.
//!
//! The janitor ([`LockManager::cleanup_expired`]) uses its own, larger age
//! threshold. The two must not be confused: the TTL decides whether a lock
//! still excludes others, the janitor threshold decides when leftover files
//! are garbage.
//!
//! Creating a lock needs no coordination, but every removal (release,
//! reclaim, janitor) re-reads the file and deletes it while holding an
//! exclusive `fs2` lock on `locks/.reclaim`. A file that is present under
//! that lock can only be removed by the caller holding it, so whatever was
//! judged expired or owned is exactly what gets deleted.

use crate::error::LockError;
use crate::fsio;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use spool_core::{Clock, HolderId, ItemId, SystemClock};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default lock validity
pub const LOCK_TTL: Duration = Duration::from_secs(30);
/// Default interval between acquisition attempts
pub const ACQUIRE_POLL: Duration = Duration::from_millis(100);

const LOCK_SUFFIX: &str = ".lock";
const REMOVAL_LOCK: &str = ".reclaim";

/// Contents of a lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub item_id: ItemId,
    pub holder_id: HolderId,
    pub acquired_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct LockManager<C: Clock = SystemClock> {
    dir: PathBuf,
    ttl: Duration,
    poll: Duration,
    clock: C,
}

impl LockManager<SystemClock> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, SystemClock)
    }
}

impl<C: Clock> LockManager<C> {
    pub fn with_clock(dir: impl Into<PathBuf>, clock: C) -> Self {
        Self { dir: dir.into(), ttl: LOCK_TTL, poll: ACQUIRE_POLL, clock }
    }

    spool_core::setters! {
        set { ttl: Duration, poll: Duration }
    }

    fn path_for(&self, item_id: &ItemId) -> Result<PathBuf, LockError> {
        if !item_id.is_path_safe() {
            return Err(LockError::InvalidId(item_id.clone()));
        }
        Ok(self.dir.join(format!("{item_id}{LOCK_SUFFIX}")))
    }

    /// Try to take the lock on `item_id`, polling until `timeout` elapses.
    ///
    /// Returns `Ok(Some(holder))` once the lock file was created by this
    /// call, `Ok(None)` if someone else still held it at the deadline.
    pub fn acquire(&self, item_id: &ItemId, timeout: Duration) -> Result<Option<HolderId>, LockError> {
        let path = self.path_for(item_id)?;
        std::fs::create_dir_all(&self.dir)?;
        let deadline = Instant::now() + timeout;
        loop {
            self.reclaim_if_expired(&path)?;

            let record = LockRecord {
                item_id: item_id.clone(),
                holder_id: HolderId::generate(self.clock.epoch_ms()),
                acquired_at_ms: self.clock.epoch_ms(),
            };
            if create_exclusive(&path, &record)? {
                debug!(item_id = %item_id, holder = %record.holder_id, "lock acquired");
                return Ok(Some(record.holder_id));
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(item_id = %item_id, ?timeout, "lock acquisition timed out");
                return Ok(None);
            }
            std::thread::sleep(self.poll.min(deadline - now));
        }
    }

    /// [`acquire`](Self::acquire), returning a guard that releases on drop.
    pub fn acquire_guard(
        &self,
        item_id: &ItemId,
        timeout: Duration,
    ) -> Result<Option<LockGuard>, LockError> {
        let path = self.path_for(item_id)?;
        Ok(self.acquire(item_id, timeout)?.map(|holder_id| LockGuard {
            path,
            item_id: item_id.clone(),
            holder_id,
        }))
    }

    /// Delete the lock file for `item_id`. Safe to call when unlocked.
    pub fn release(&self, item_id: &ItemId) -> Result<(), LockError> {
        let path = self.path_for(item_id)?;
        if with_removal_lock(&self.dir, || Ok(fsio::remove_if_exists(&path)?))? {
            debug!(item_id = %item_id, "lock released");
        }
        Ok(())
    }

    /// Whether a lock file exists and is younger than the TTL.
    pub fn is_locked(&self, item_id: &ItemId) -> Result<bool, LockError> {
        let path = self.path_for(item_id)?;
        Ok(self.age(&path)?.is_some_and(|age| age < self.ttl))
    }

    /// Current holder of a valid lock, if any.
    pub fn holder(&self, item_id: &ItemId) -> Result<Option<LockRecord>, LockError> {
        let path = self.path_for(item_id)?;
        if !self.age(&path)?.is_some_and(|age| age < self.ttl) {
            return Ok(None);
        }
        Ok(fsio::read_json::<LockRecord>(&path)?.and_then(Result::ok))
    }

    /// Janitor: delete lock files older than `max_age`. Returns the count.
    pub fn cleanup_expired(&self, max_age: Duration) -> Result<usize, LockError> {
        if !self.dir.is_dir() {
            return Ok(0);
        }
        let removed = with_removal_lock(&self.dir, || {
            let mut removed = 0;
            for path in fsio::files_with_suffix(&self.dir, LOCK_SUFFIX)? {
                if self.age(&path)?.is_some_and(|age| age >= max_age) && fsio::remove_if_exists(&path)? {
                    debug!(path = %path.display(), "removed expired lock");
                    removed += 1;
                }
            }
            Ok(removed)
        })?;
        if removed > 0 {
            info!(removed, ?max_age, "cleaned up expired locks");
        }
        Ok(removed)
    }

    /// Age of the lock at `path` from its recorded acquisition time, or
    /// from its mtime if the record is unreadable (e.g. caught mid-write).
    fn age(&self, path: &Path) -> Result<Option<Duration>, LockError> {
        match fsio::read_json::<LockRecord>(path)? {
            None => Ok(None),
            Some(Ok(record)) => Ok(Some(self.clock.since(record.acquired_at_ms))),
            Some(Err(_)) => Ok(fsio::mtime_age(path, &self.clock)?),
        }
    }

    /// Remove the lock at `path` if it has outlived the TTL.
    fn reclaim_if_expired(&self, path: &Path) -> Result<(), LockError> {
        if !self.age(path)?.is_some_and(|age| age >= self.ttl) {
            return Ok(());
        }
        with_removal_lock(&self.dir, || {
            // Another contender may have reclaimed and re-taken it meanwhile
            if self.age(path)?.is_some_and(|age| age >= self.ttl) && fsio::remove_if_exists(path)? {
                info!(path = %path.display(), "reclaimed abandoned lock");
            }
            Ok(())
        })
    }
}

/// Run `f` while holding the exclusive lock that serializes lock-file removal.
fn with_removal_lock<R>(dir: &Path, f: impl FnOnce() -> Result<R, LockError>) -> Result<R, LockError> {
    std::fs::create_dir_all(dir)?;
    let lock = OpenOptions::new().write(true).create(true).truncate(false).open(dir.join(REMOVAL_LOCK))?;
    lock.lock_exclusive()?;

    let result = f();

    if let Err(e) = FileExt::unlock(&lock) {
        warn!(error = %e, "failed to release lock removal guard");
    }
    result
}

/// Create the lock file, `Ok(false)` if it already exists.
fn create_exclusive(path: &Path, record: &LockRecord) -> Result<bool, LockError> {
    let mut file = match std::fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    let json = serde_json::to_vec(record).map_err(std::io::Error::other)?;
    if let Err(e) = file.write_all(&json).and_then(|_| file.sync_all()) {
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(true)
}

/// Held lock that is released when dropped.
///
/// Only deletes the lock file if it still belongs to this holder, so a guard
/// that outlived its TTL does not remove a lock someone else has since taken.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    item_id: ItemId,
    holder_id: HolderId,
}

impl LockGuard {
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn holder_id(&self) -> &HolderId {
        &self.holder_id
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let Some(dir) = self.path.parent() else {
            return;
        };
        let released = with_removal_lock(dir, || match fsio::read_json::<LockRecord>(&self.path)? {
            Some(Ok(record)) if record.holder_id != self.holder_id => Ok(Some(record.holder_id)),
            None => Ok(None),
            Some(_) => {
                fsio::remove_if_exists(&self.path)?;
                Ok(None)
            }
        });
        match released {
            Ok(None) => debug!(item_id = %self.item_id, "lock released"),
            Ok(Some(holder)) => {
                warn!(item_id = %self.item_id, holder = %holder, "lock was taken over before release");
            }
            Err(e) => warn!(item_id = %self.item_id, error = %e, "failed to release lock"),
        }
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
