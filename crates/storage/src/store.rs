// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item store: one JSON file per item, partitioned by status, plus the index.
//!
//! Finding "what is pending" is a listing of one small directory (or one
//! index read) instead of a scan over every item ever queued. The price is
//! that a status change has to move the file between partitions.
//!
//! [`ItemStore::move_to`] performs three independent filesystem steps
//! (write new, delete old, update index). A crash between them can leave a
//! duplicate file or a stale index entry. Callers that need a consistent
//! outcome go through the engine's transactional move; everyone else accepts
//! best-effort semantics and relies on self-healing reads and
//! [`ItemStore::rebuild_index`].

use crate::error::StoreError;
use crate::fsio;
use crate::index::Index;
use crate::layout::Layout;
use serde::{Deserialize, Serialize};
use spool_core::{Clock, IndexEntry, ItemId, NewItem, QueueItem, Status, SystemClock};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const LOAD_ATTEMPTS: u32 = 20;
const LOAD_RETRY_DELAY: Duration = Duration::from_millis(2);

/// Item counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl Stats {
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::Processing => self.processing,
            Status::Completed => self.completed,
            Status::Failed => self.failed,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }

    fn bump(&mut self, status: Status) {
        match status {
            Status::Pending => self.pending += 1,
            Status::Processing => self.processing += 1,
            Status::Completed => self.completed += 1,
            Status::Failed => self.failed += 1,
        }
    }
}

/// Outcome of [`ItemStore::rebuild_index`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub indexed: usize,
    /// Extra copies of an item found in other partitions and deleted
    pub duplicates_removed: usize,
    /// Files that could not be decoded (left in place)
    pub unreadable: usize,
}

/// File-backed item store.
///
/// Cheap to clone; clones share configuration and fault-injection state.
#[derive(Clone)]
pub struct ItemStore<C: Clock = SystemClock> {
    layout: Layout,
    index: Index,
    clock: C,
    fail_after_write: Arc<AtomicBool>,
}

impl ItemStore<SystemClock> {
    pub fn open(layout: Layout) -> Result<Self, StoreError> {
        Self::with_clock(layout, SystemClock)
    }
}

impl<C: Clock> ItemStore<C> {
    /// Open a store rooted at `layout`, creating its directories.
    pub fn with_clock(layout: Layout, clock: C) -> Result<Self, StoreError> {
        layout.ensure().inspect_err(|e| {
            warn!(root = %layout.root().display(), error = %e, "failed to create store directories");
        })?;
        let index = Index::new(layout.index_path(), layout.index_lock_path());
        Ok(Self { layout, index, clock, fail_after_write: Arc::new(AtomicBool::new(false)) })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Enqueue a new pending item and return its id.
    pub fn create(&self, new: NewItem) -> Result<ItemId, StoreError> {
        let id = ItemId::generate(self.clock.epoch_ms());
        let item = QueueItem::new(id.clone(), new, &self.clock);

        if self.index.get(&id)?.is_some() {
            return Err(StoreError::DuplicateId(id));
        }

        let path = self.layout.item_path(Status::Pending, &item.storage_key);
        std::fs::create_dir_all(self.layout.partition_dir(Status::Pending))?;
        match fsio::write_json_new(&path, &item) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(item_id = %id, "generated id collides with an existing item file");
                return Err(StoreError::DuplicateId(id));
            }
            Err(e) => {
                warn!(item_id = %id, error = %e, "failed to write item file");
                return Err(e.into());
            }
        }

        if let Err(e) = self.index.upsert(item.index_entry()) {
            warn!(item_id = %id, error = %e, "failed to index new item, removing its file");
            let _ = fsio::remove_if_exists(&path);
            return Err(e);
        }

        info!(item_id = %id, title = %item.payload.title, "item created");
        Ok(id)
    }

    /// Load an item through its index entry.
    ///
    /// An index entry whose file has disappeared is deleted and reported as
    /// `NotFound`; this is a normal outcome, not corruption. The entry is
    /// only dropped if, under the index lock, it is unchanged and no
    /// partition holds the item. Otherwise a move is in flight and the read
    /// is retried.
    pub fn load(&self, id: &ItemId) -> Result<QueueItem, StoreError> {
        if !id.is_path_safe() {
            return Err(StoreError::NotFound(id.clone()));
        }
        for attempt in 0..LOAD_ATTEMPTS {
            let Some(entry) = self.index.get(id)? else {
                return Err(StoreError::NotFound(id.clone()));
            };
            let path = self.layout.item_path(entry.status, &entry.storage_key);
            match fsio::read_json::<QueueItem>(&path)? {
                Some(Ok(item)) => return Ok(item),
                Some(Err(source)) => {
                    warn!(item_id = %id, error = %source, "item file is not valid JSON");
                    return Err(StoreError::Corrupt { path, source });
                }
                None => {}
            }

            let dropped = self.index.remove_if(id, |current| {
                current.status == entry.status
                    && current.storage_key == entry.storage_key
                    && !self.on_disk_anywhere(&entry.storage_key)
            })?;
            if dropped {
                debug!(item_id = %id, status = %entry.status, "index entry has no file, dropped it");
                return Err(StoreError::NotFound(id.clone()));
            }
            debug!(item_id = %id, attempt, "item moved while loading, retrying");
            std::thread::sleep(LOAD_RETRY_DELAY);
        }
        Err(StoreError::NotFound(id.clone()))
    }

    fn on_disk_anywhere(&self, storage_key: &str) -> bool {
        Status::ALL.into_iter().any(|status| self.partition_contains(status, storage_key))
    }

    /// Move an item to `to`, recording `error` as a failed attempt if given.
    ///
    /// Best effort: not atomic across its three steps (see module docs).
    pub fn move_to(
        &self,
        id: &ItemId,
        to: Status,
        error: Option<&str>,
    ) -> Result<QueueItem, StoreError> {
        let mut item = self.load(id)?;
        let from = item.status;
        item.transition(to, error, self.clock.epoch_ms());

        let new_path = self.layout.item_path(to, &item.storage_key);
        std::fs::create_dir_all(self.layout.partition_dir(to))?;
        fsio::write_json_atomic(&new_path, &item).inspect_err(|e| {
            warn!(item_id = %id, to = %to, error = %e, "failed to write moved item");
        })?;

        if self.fail_after_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("injected failure after write")));
        }

        if from != to {
            let old_path = self.layout.item_path(from, &item.storage_key);
            fsio::remove_if_exists(&old_path).inspect_err(|e| {
                warn!(item_id = %id, from = %from, error = %e, "failed to delete old item file");
            })?;
        }

        self.index.upsert(item.index_entry())?;
        debug!(item_id = %id, from = %from, to = %to, "item moved");
        Ok(item)
    }

    /// Delete an item's file and index entry. `false` if it was not indexed.
    pub fn remove(&self, id: &ItemId) -> Result<bool, StoreError> {
        let Some(entry) = self.index.get(id)? else {
            return Ok(false);
        };
        fsio::remove_if_exists(&self.layout.item_path(entry.status, &entry.storage_key))?;
        self.index.remove(id)?;
        info!(item_id = %id, "item removed");
        Ok(true)
    }

    /// Index entries in `status` by (priority, age), truncated to `limit`.
    pub fn list_by_status(
        &self,
        status: Status,
        limit: Option<usize>,
    ) -> Result<Vec<IndexEntry>, StoreError> {
        let mut entries: Vec<_> = self
            .index
            .read()?
            .entries
            .into_values()
            .filter(|e| e.status == status)
            .collect();
        sort_entries(&mut entries);
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// Case-insensitive search over indexed titles and categories.
    pub fn search(&self, needle: &str, status: Option<Status>) -> Result<Vec<IndexEntry>, StoreError> {
        let needle = needle.to_lowercase();
        let mut entries: Vec<_> = self
            .index
            .read()?
            .entries
            .into_values()
            .filter(|e| status.is_none_or(|s| e.status == s))
            .filter(|e| e.matches(&needle))
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    pub fn stats(&self) -> Result<Stats, StoreError> {
        let mut stats = Stats::default();
        for entry in self.index.read()?.entries.values() {
            stats.bump(entry.status);
        }
        Ok(stats)
    }

    /// Delete completed or failed items that have not changed for `age`.
    ///
    /// Retention only; returns how many items were removed.
    pub fn cleanup_older_than(&self, status: Status, age: Duration) -> Result<usize, StoreError> {
        if !status.is_terminal() {
            return Err(StoreError::NotTerminal(status));
        }
        let clock = &self.clock;
        let layout = &self.layout;
        let removed = self.index.update(|entries| {
            let expired: Vec<ItemId> = entries
                .values()
                .filter(|e| e.status == status && clock.since(e.updated_at_ms) > age)
                .map(|e| e.id.clone())
                .collect();
            let mut removed = 0;
            for id in &expired {
                let Some(entry) = entries.get(id.as_str()) else { continue };
                let path = layout.item_path(entry.status, &entry.storage_key);
                match fsio::remove_if_exists(&path) {
                    Ok(_) => {
                        entries.remove(id.as_str());
                        removed += 1;
                    }
                    Err(e) => warn!(item_id = %id, error = %e, "failed to delete expired item"),
                }
            }
            (removed, removed > 0)
        })?;
        if removed > 0 {
            info!(status = %status, removed, "pruned old items");
        }
        Ok(removed)
    }

    /// Write `item` into the partition of its own status, replacing any
    /// existing file there. Does not touch the index.
    pub fn write_item(&self, item: &QueueItem) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.layout.partition_dir(item.status))?;
        fsio::write_json_atomic(&self.layout.item_path(item.status, &item.storage_key), item)?;
        Ok(())
    }

    /// Delete the file for `storage_key` from one partition, if present.
    pub fn discard_file(&self, status: Status, storage_key: &str) -> Result<bool, StoreError> {
        Ok(fsio::remove_if_exists(&self.layout.item_path(status, storage_key))?)
    }

    /// Whether the `status` partition holds a file for `storage_key`.
    pub fn partition_contains(&self, status: Status, storage_key: &str) -> bool {
        self.layout.item_path(status, storage_key).exists()
    }

    /// Overwrite the index entry for `item`.
    pub fn reindex(&self, item: &QueueItem) -> Result<(), StoreError> {
        self.index.upsert(item.index_entry())
    }

    /// Rebuild the index from the partition directories.
    ///
    /// When one item has files in several partitions (a crash mid-move), the
    /// copy with the newest `updated_at_ms` wins and the others are deleted.
    /// The partition a file sits in is authoritative for its status.
    pub fn rebuild_index(&self) -> Result<RebuildReport, StoreError> {
        let mut report = RebuildReport::default();
        let mut newest: BTreeMap<ItemId, QueueItem> = BTreeMap::new();

        for status in Status::ALL {
            for path in fsio::files_with_suffix(&self.layout.partition_dir(status), ".json")? {
                let Some(mut item) = read_item_file(&path, &mut report) else { continue };
                if item.status != status {
                    warn!(item_id = %item.id, recorded = %item.status, partition = %status, "item status disagrees with its partition");
                    item.status = status;
                    self.write_item(&item)?;
                }
                match newest.get(item.id.as_str()) {
                    Some(kept) if kept.updated_at_ms >= item.updated_at_ms => {
                        self.discard_file(item.status, &item.storage_key)?;
                        report.duplicates_removed += 1;
                    }
                    Some(kept) => {
                        self.discard_file(kept.status, &kept.storage_key)?;
                        report.duplicates_removed += 1;
                        newest.insert(item.id.clone(), item);
                    }
                    None => {
                        newest.insert(item.id.clone(), item);
                    }
                }
            }
        }

        let entries: BTreeMap<ItemId, IndexEntry> =
            newest.into_iter().map(|(id, item)| (id, item.index_entry())).collect();
        report.indexed = entries.len();
        self.index.replace(entries)?;
        info!(
            indexed = report.indexed,
            duplicates_removed = report.duplicates_removed,
            unreadable = report.unreadable,
            "index rebuilt"
        );
        Ok(report)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<C: Clock> ItemStore<C> {
    /// Make the next [`ItemStore::move_to`] fail right after it has written
    /// the item into its new partition.
    pub fn fail_next_move_after_write(&self) {
        self.fail_after_write.store(true, Ordering::SeqCst);
    }
}

fn sort_entries(entries: &mut [IndexEntry]) {
    entries.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

fn read_item_file(path: &Path, report: &mut RebuildReport) -> Option<QueueItem> {
    match fsio::read_json::<QueueItem>(path) {
        Ok(Some(Ok(item))) => Some(item),
        Ok(Some(Err(e))) => {
            warn!(path = %path.display(), error = %e, "skipping corrupt item file");
            report.unreadable += 1;
            None
        }
        // Vanished between listing and reading
        Ok(None) => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read item file");
            report.unreadable += 1;
            None
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
