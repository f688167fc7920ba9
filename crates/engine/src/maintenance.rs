// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Janitorial operations: reaping leftover lock and transaction files,
//! retention, and recovery of moves interrupted by a crash.

use crate::error::QueueError;
use crate::queue::Queue;
use crate::worker::WorkerProbe;
use serde::{Deserialize, Serialize};
use spool_core::{Clock, Status};
use spool_storage::{RebuildReport, StoreError, TxError};
use std::time::Duration;
use tracing::{info, warn};

/// Files removed by one [`Queue::reap`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReapReport {
    pub locks: usize,
    pub transactions: usize,
}

/// Outcome of [`Queue::recover_orphans`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub rolled_back: usize,
    /// Records dropped because the item has moved on since
    pub superseded: usize,
    /// Records left alone because their item is locked
    pub skipped_locked: usize,
    pub unreadable: usize,
}

impl<C: Clock, W: WorkerProbe> Queue<C, W> {
    /// Delete lock files older than `max_age`.
    pub fn cleanup_expired_locks(&self, max_age: Duration) -> Result<usize, QueueError> {
        Ok(self.locks.cleanup_expired(max_age)?)
    }

    /// Delete transaction records older than `max_age`, without rolling
    /// them back.
    pub fn cleanup_expired_transactions(&self, max_age: Duration) -> Result<usize, QueueError> {
        Ok(self.txlog.cleanup_expired(max_age)?)
    }

    /// Delete completed or failed items not updated for `age`.
    pub fn cleanup_older_than(&self, status: Status, age: Duration) -> Result<usize, QueueError> {
        Ok(self.store.cleanup_older_than(status, age)?)
    }

    /// One janitor pass with the configured thresholds.
    pub fn reap(&self) -> Result<ReapReport, QueueError> {
        let report = ReapReport {
            locks: self.cleanup_expired_locks(self.config.lock_reap_age)?,
            transactions: self.cleanup_expired_transactions(self.config.tx_reap_age)?,
        };
        info!(locks = report.locks, transactions = report.transactions, "reap finished");
        Ok(report)
    }

    pub fn rebuild_index(&self) -> Result<RebuildReport, QueueError> {
        Ok(self.store.rebuild_index()?)
    }

    /// Roll back transactions left behind by a crashed process.
    ///
    /// Only records older than the lock TTL are considered; a younger one
    /// may belong to a move still in flight. Each item is locked while its
    /// record is handled, and a locked item is skipped. A record whose item
    /// now sits in neither the previous nor the target status was overtaken
    /// by a later change and is dropped instead of restored.
    pub fn recover_orphans(&self) -> Result<RecoveryReport, QueueError> {
        let mut report = RecoveryReport::default();

        for tx_id in self.txlog.list()? {
            match self.txlog.age(&tx_id)? {
                Some(age) if age >= self.config.lock_ttl => {}
                _ => continue,
            }
            let tx = match self.txlog.read(&tx_id) {
                Ok(tx) => tx,
                Err(TxError::NotFound(_)) => continue,
                Err(e) => {
                    warn!(tx = %tx_id, error = %e, "skipping unreadable transaction");
                    report.unreadable += 1;
                    continue;
                }
            };
            if !tx.item_id.is_path_safe() {
                warn!(tx = %tx_id, "transaction names an invalid item id");
                report.unreadable += 1;
                continue;
            }

            let Some(_guard) = self.locks.acquire_guard(&tx.item_id, Duration::ZERO)? else {
                report.skipped_locked += 1;
                continue;
            };

            let current = match self.store.load(&tx.item_id) {
                Ok(item) => Some(item.status),
                Err(StoreError::NotFound(_)) | Err(StoreError::Corrupt { .. }) => None,
                Err(e) => return Err(e.into()),
            };
            let backup = &tx.backup;
            let overtaken = current
                .is_some_and(|status| status != backup.previous_status && status != backup.target_status);

            if overtaken {
                self.txlog.commit(&tx_id)?;
                info!(tx = %tx_id, item_id = %tx.item_id, "dropped transaction overtaken by a later change");
                report.superseded += 1;
            } else if self.txlog.rollback(&tx_id, &self.store) {
                report.rolled_back += 1;
            }
        }

        if report != RecoveryReport::default() {
            info!(
                rolled_back = report.rolled_back,
                superseded = report.superseded,
                skipped_locked = report.skipped_locked,
                unreadable = report.unreadable,
                "orphan recovery finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
