// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue orchestrator.
//!
//! Ties the item store, per-item locks, the transaction log and the worker
//! probe together. Every status change made here runs as
//!
//! ```text
//! load ─► guard ─► validate ─► lock ─► reload + revalidate ─► safe_move ─► unlock
//! ```
//!
//! where `safe_move` brackets the store's best-effort move with a
//! transaction record so a failed move is rolled back. The lock is held by a
//! [`LockGuard`](spool_storage::LockGuard) and released on every exit path.

use crate::config::QueueConfig;
use crate::error::{QueueError, StorageFailure};
use crate::worker::{Liveness, PidFileProbe, WorkerProbe};
use serde::{Deserialize, Serialize};
use spool_core::{Clock, IndexEntry, ItemId, NewItem, QueueItem, Status, SystemClock};
use spool_storage::{Backup, ItemStore, LockManager, Stats, StoreError, TransactionLog};
use tracing::{debug, info, warn};

/// Action recorded in the transaction log for status changes
pub const STATUS_UPDATE: &str = "status_update";

/// Result of an orchestrated status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advance {
    pub item_id: ItemId,
    pub previous_status: Status,
    pub new_status: Status,
}

pub struct Queue<C: Clock = SystemClock, W: WorkerProbe = PidFileProbe> {
    pub(crate) config: QueueConfig,
    pub(crate) clock: C,
    pub(crate) store: ItemStore<C>,
    pub(crate) locks: LockManager<C>,
    pub(crate) txlog: TransactionLog<C>,
    worker: W,
}

impl Queue<SystemClock, PidFileProbe> {
    /// Open the queue described by `config`, probing the worker through its
    /// PID file.
    pub fn open(config: QueueConfig) -> Result<Self, QueueError> {
        let worker = PidFileProbe::new(&config.worker_pid_file);
        Self::with_parts(config, SystemClock, worker)
    }
}

impl<C: Clock, W: WorkerProbe> Queue<C, W> {
    pub fn with_parts(config: QueueConfig, clock: C, worker: W) -> Result<Self, QueueError> {
        let store = ItemStore::with_clock(config.layout.clone(), clock.clone())?;
        let locks = LockManager::with_clock(config.layout.locks_dir(), clock.clone())
            .ttl(config.lock_ttl)
            .poll(config.acquire_poll);
        let txlog = TransactionLog::with_clock(config.layout.transactions_dir(), clock.clone());
        Ok(Self { config, clock, store, locks, txlog, worker })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn store(&self) -> &ItemStore<C> {
        &self.store
    }

    pub fn locks(&self) -> &LockManager<C> {
        &self.locks
    }

    pub fn transactions(&self) -> &TransactionLog<C> {
        &self.txlog
    }

    pub fn create(&self, new: NewItem) -> Result<ItemId, QueueError> {
        Ok(self.store.create(new)?)
    }

    pub fn load(&self, id: &ItemId) -> Result<QueueItem, QueueError> {
        Ok(self.store.load(id)?)
    }

    pub fn list_by_status(&self, status: Status, limit: Option<usize>) -> Result<Vec<IndexEntry>, QueueError> {
        Ok(self.store.list_by_status(status, limit)?)
    }

    pub fn search(&self, needle: &str, status: Option<Status>) -> Result<Vec<IndexEntry>, QueueError> {
        Ok(self.store.search(needle, status)?)
    }

    pub fn stats(&self) -> Result<Stats, QueueError> {
        Ok(self.store.stats()?)
    }

    pub fn is_worker_alive(&self) -> bool {
        self.worker.is_alive()
    }

    /// Move `id` to `target` inside a transaction.
    ///
    /// Does not take the item lock or validate the transition; callers that
    /// need either go through [`process_advance`](Self::process_advance) or
    /// [`move_item`](Self::move_item). If the move fails the item is rolled
    /// back to its previous status and contents.
    pub fn safe_move(
        &self,
        id: &ItemId,
        target: Status,
        error: Option<&str>,
    ) -> Result<QueueItem, QueueError> {
        let item = self.store.load(id)?;
        let backup = Backup { previous_status: item.status, target_status: target, previous_item: item };
        let tx = self.txlog.begin(id, STATUS_UPDATE, backup)?;

        match self.store.move_to(id, target, error) {
            Ok(moved) => match self.txlog.commit(&tx) {
                Ok(_) => Ok(moved),
                Err(e) => {
                    warn!(item_id = %id, tx = %tx, error = %e, "commit failed, rolling back");
                    self.txlog.rollback(&tx, &self.store);
                    Err(e.into())
                }
            },
            Err(e) => {
                warn!(item_id = %id, tx = %tx, to = %target, error = %e, "status update failed, rolling back");
                self.txlog.rollback(&tx, &self.store);
                Err(match e {
                    StoreError::NotFound(id) => QueueError::NotFound(id),
                    other => QueueError::Storage(StorageFailure::RolledBack(other)),
                })
            }
        }
    }

    /// Advance `id` to the next status in the cycle.
    pub fn process_advance(&self, id: &ItemId) -> Result<Advance, QueueError> {
        self.transition(id, None, |queue, item| {
            queue.ensure_not_processing(item)?;
            let target = item.status.next_status();
            if !item.status.is_transition_allowed(target) {
                return Err(QueueError::InvalidTransition { from: item.status, to: target });
            }
            Ok(target)
        })
    }

    /// Move `id` to an explicit `target` allowed by the transition table,
    /// recording `error` as a failed attempt if given.
    ///
    /// This is how a worker reports the outcome of an item it owns, so unlike
    /// [`process_advance`](Self::process_advance) it does not refuse fresh
    /// processing items.
    pub fn move_item(
        &self,
        id: &ItemId,
        target: Status,
        error: Option<&str>,
    ) -> Result<Advance, QueueError> {
        self.transition(id, error, |_, item| {
            if !item.status.table_allows(target) {
                return Err(QueueError::InvalidTransition { from: item.status, to: target });
            }
            Ok(target)
        })
    }

    /// Plan the change outside the lock to reject early, then plan it again
    /// against the item as it is once the lock is held.
    fn transition<F>(&self, id: &ItemId, error: Option<&str>, plan: F) -> Result<Advance, QueueError>
    where
        F: Fn(&Self, &QueueItem) -> Result<Status, QueueError>,
    {
        let item = self.store.load(id)?;
        plan(self, &item)?;

        let Some(_guard) = self.locks.acquire_guard(id, self.config.acquire_timeout)? else {
            warn!(item_id = %id, timeout = ?self.config.acquire_timeout, "timed out waiting for item lock");
            return Err(QueueError::LockTimeout(id.clone()));
        };

        let item = self.store.load(id)?;
        let target = plan(self, &item)?;
        let moved = self.safe_move(id, target, error)?;
        info!(item_id = %id, from = %item.status, to = %moved.status, "item status changed");
        Ok(Advance { item_id: id.clone(), previous_status: item.status, new_status: moved.status })
    }

    /// Reject items an external worker is still working on.
    ///
    /// A processing item counts as owned while it was updated within the
    /// stale timeout, unless the worker's PID file names a process that no
    /// longer exists.
    fn ensure_not_processing(&self, item: &QueueItem) -> Result<(), QueueError> {
        if item.status != Status::Processing {
            return Ok(());
        }
        let age = self.clock.since(item.updated_at_ms);
        if age >= self.config.processing_stale_timeout {
            info!(item_id = %item.id, ?age, "processing item is stale, assuming its worker died");
            return Ok(());
        }
        match self.worker.liveness() {
            Liveness::Dead => {
                info!(item_id = %item.id, "worker is not running, releasing processing item");
                Ok(())
            }
            liveness => {
                debug!(item_id = %item.id, ?age, %liveness, "item is owned by a worker");
                Err(QueueError::Conflict(item.id.clone()))
            }
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
