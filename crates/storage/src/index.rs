// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index file: id → [`IndexEntry`] for listing without opening item files.
//!
//! The whole index is one JSON document replaced atomically on every write.
//! Read-modify-write cycles hold an exclusive `fs2` lock on a sibling
//! `index.lock` so concurrent processes do not lose each other's updates.
//! Plain reads take no lock; they always see some complete version.

use crate::error::StoreError;
use crate::fsio;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use spool_core::{IndexEntry, ItemId};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Current index schema version
pub const CURRENT_INDEX_VERSION: u32 = 1;

/// Serialized form of the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexFile {
    #[serde(rename = "v")]
    pub version: u32,
    pub entries: BTreeMap<ItemId, IndexEntry>,
}

#[derive(Debug, Clone)]
pub(crate) struct Index {
    path: PathBuf,
    lock_path: PathBuf,
}

impl Index {
    pub(crate) fn new(path: PathBuf, lock_path: PathBuf) -> Self {
        Self { path, lock_path }
    }

    /// Load the current index. A missing file is an empty index.
    pub(crate) fn read(&self) -> Result<IndexFile, StoreError> {
        match fsio::read_json::<IndexFile>(&self.path)? {
            None => Ok(IndexFile { version: CURRENT_INDEX_VERSION, entries: BTreeMap::new() }),
            Some(Ok(file)) => Ok(file),
            Some(Err(source)) => Err(StoreError::Corrupt { path: self.path.clone(), source }),
        }
    }

    pub(crate) fn get(&self, id: &str) -> Result<Option<IndexEntry>, StoreError> {
        Ok(self.read()?.entries.remove(id))
    }

    /// Read, mutate and write back the index under the index lock.
    ///
    /// The file is only rewritten when `f` reports a change.
    pub(crate) fn update<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<ItemId, IndexEntry>) -> (R, bool),
    ) -> Result<R, StoreError> {
        let lock = OpenOptions::new().write(true).create(true).truncate(false).open(&self.lock_path)?;
        lock.lock_exclusive()?;

        let result = self.modify(f);

        if let Err(e) = FileExt::unlock(&lock) {
            tracing::warn!(error = %e, "failed to release index lock");
        }
        result
    }

    fn modify<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<ItemId, IndexEntry>) -> (R, bool),
    ) -> Result<R, StoreError> {
        let mut file = self.read()?;
        let (out, changed) = f(&mut file.entries);
        if changed {
            file.version = CURRENT_INDEX_VERSION;
            fsio::write_json_atomic(&self.path, &file)?;
        }
        Ok(out)
    }

    pub(crate) fn upsert(&self, entry: IndexEntry) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(entry.id.clone(), entry);
            ((), true)
        })
    }

    /// Remove an entry, returning whether one existed.
    pub(crate) fn remove(&self, id: &ItemId) -> Result<bool, StoreError> {
        self.update(|entries| {
            let existed = entries.remove(id.as_str()).is_some();
            (existed, existed)
        })
    }

    /// Remove an entry only if `still_stale` holds for it once the
    /// index lock is held. Returns whether it was removed.
    pub(crate) fn remove_if(
        &self,
        id: &ItemId,
        still_stale: impl FnOnce(&IndexEntry) -> bool,
    ) -> Result<bool, StoreError> {
        self.update(|entries| {
            let remove = entries.get(id.as_str()).is_some_and(still_stale);
            if remove {
                entries.remove(id.as_str());
            }
            (remove, remove)
        })
    }

    /// Replace the whole index.
    pub(crate) fn replace(&self, new_entries: BTreeMap<ItemId, IndexEntry>) -> Result<(), StoreError> {
        self.update(|entries| {
            *entries = new_entries;
            ((), true)
        })
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
