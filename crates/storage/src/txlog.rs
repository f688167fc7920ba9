// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead transaction log for status changes.
//!
//! One file per transaction under `transactions/`. A record is written
//! before the item is touched and deleted once the move is committed or
//! rolled back, so a file that is still present after its operation should
//! have finished marks an interrupted move.

use crate::error::TxError;
use crate::fsio;
use crate::store::ItemStore;
use serde::{Deserialize, Serialize};
use spool_core::{Clock, ItemId, QueueItem, Status, SystemClock, TransactionId};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const TX_SUFFIX: &str = ".json";

/// State needed to undo a status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub previous_status: Status,
    pub target_status: Status,
    /// The whole item as it was before the change
    pub previous_item: QueueItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Started,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub item_id: ItemId,
    pub action: String,
    pub backup: Backup,
    pub started_at_ms: u64,
    pub state: TxState,
}

#[derive(Debug, Clone)]
pub struct TransactionLog<C: Clock = SystemClock> {
    dir: PathBuf,
    clock: C,
}

impl TransactionLog<SystemClock> {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, SystemClock)
    }
}

impl<C: Clock> TransactionLog<C> {
    pub fn with_clock(dir: impl Into<PathBuf>, clock: C) -> Self {
        Self { dir: dir.into(), clock }
    }

    fn path_for(&self, id: &TransactionId) -> PathBuf {
        self.dir.join(format!("{id}{TX_SUFFIX}"))
    }

    /// Persist a `Started` record. Nothing may be mutated until this returns.
    pub fn begin(
        &self,
        item_id: &ItemId,
        action: &str,
        backup: Backup,
    ) -> Result<TransactionId, TxError> {
        let now = self.clock.epoch_ms();
        let tx = Transaction {
            id: TransactionId::generate(now),
            item_id: item_id.clone(),
            action: action.to_string(),
            backup,
            started_at_ms: now,
            state: TxState::Started,
        };
        std::fs::create_dir_all(&self.dir)?;
        fsio::write_json_new(&self.path_for(&tx.id), &tx).inspect_err(|e| {
            warn!(item_id = %item_id, error = %e, "failed to write transaction record");
        })?;
        debug!(tx = %tx.id, item_id = %item_id, action, "transaction started");
        Ok(tx.id)
    }

    /// Delete the record. `false` if there was none.
    pub fn commit(&self, id: &TransactionId) -> Result<bool, TxError> {
        let removed = fsio::remove_if_exists(&self.path_for(id))?;
        if removed {
            debug!(tx = %id, "transaction committed");
        }
        Ok(removed)
    }

    pub fn read(&self, id: &TransactionId) -> Result<Transaction, TxError> {
        match fsio::read_json::<Transaction>(&self.path_for(id))? {
            Some(Ok(tx)) => Ok(tx),
            Some(Err(source)) => Err(TxError::Corrupt { id: id.clone(), source }),
            None => Err(TxError::NotFound(id.clone())),
        }
    }

    /// Ids of all transactions on disk, sorted.
    pub fn list(&self) -> Result<Vec<TransactionId>, TxError> {
        Ok(fsio::files_with_suffix(&self.dir, TX_SUFFIX)?
            .iter()
            .filter_map(|path| fsio::stem_before(path, TX_SUFFIX))
            .map(TransactionId::from)
            .collect())
    }

    /// How long ago the transaction started, from its record or, if that
    /// cannot be decoded, from the file's mtime.
    pub fn age(&self, id: &TransactionId) -> Result<Option<Duration>, TxError> {
        let path = self.path_for(id);
        match fsio::read_json::<Transaction>(&path)? {
            None => Ok(None),
            Some(Ok(tx)) => Ok(Some(self.clock.since(tx.started_at_ms))),
            Some(Err(_)) => Ok(fsio::mtime_age(&path, &self.clock)?),
        }
    }

    /// Undo the change recorded by `id` and delete the record.
    ///
    /// Returns `false` if the record is missing or unreadable. Each restore
    /// step is attempted even if an earlier one failed.
    pub fn rollback<S: Clock>(&self, id: &TransactionId, store: &ItemStore<S>) -> bool {
        let tx = match self.read(id) {
            Ok(tx) => tx,
            Err(e) => {
                warn!(tx = %id, error = %e, "cannot roll back");
                return false;
            }
        };
        let backup = &tx.backup;
        let item = &backup.previous_item;

        if backup.target_status != backup.previous_status {
            if let Err(e) = store.discard_file(backup.target_status, &item.storage_key) {
                warn!(tx = %id, item_id = %tx.item_id, error = %e, "rollback: failed to remove target file");
            }
        }
        if let Err(e) = store.write_item(item) {
            warn!(tx = %id, item_id = %tx.item_id, error = %e, "rollback: failed to restore item file");
        }
        if let Err(e) = store.reindex(item) {
            warn!(tx = %id, item_id = %tx.item_id, error = %e, "rollback: failed to restore index entry");
        }
        if let Err(e) = fsio::remove_if_exists(&self.path_for(id)) {
            warn!(tx = %id, error = %e, "rollback: failed to delete transaction record");
        }

        info!(tx = %id, item_id = %tx.item_id, status = %backup.previous_status, "transaction rolled back");
        true
    }

    /// Janitor: delete transaction records older than `max_age`.
    pub fn cleanup_expired(&self, max_age: Duration) -> Result<usize, TxError> {
        let mut removed = 0;
        for id in self.list()? {
            if self.age(&id)?.is_some_and(|age| age >= max_age)
                && fsio::remove_if_exists(&self.path_for(&id))?
            {
                debug!(tx = %id, "removed expired transaction");
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, ?max_age, "cleaned up expired transactions");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "txlog_tests.rs"]
mod tests;
