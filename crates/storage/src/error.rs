// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error types.

use spool_core::{ItemId, Status, TransactionId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the item store and its index
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("item id already exists: {0}")]
    DuplicateId(ItemId),
    #[error("corrupt record {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cleanup only applies to completed or failed items, not {0}")]
    NotTerminal(Status),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors from the lock manager.
///
/// Failing to get a lock before the timeout is not an error; `acquire`
/// reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid lock name: {0}")]
    InvalidId(ItemId),
}

/// Errors from the transaction log
#[derive(Debug, Error)]
pub enum TxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("transaction not found: {0}")]
    NotFound(TransactionId),
    #[error("corrupt transaction {id}: {source}")]
    Corrupt {
        id: TransactionId,
        #[source]
        source: serde_json::Error,
    },
}
