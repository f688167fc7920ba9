// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue errors.
//!
//! Messages are short, stable and never include filesystem paths; the
//! underlying storage error stays reachable through `source()` and is logged
//! where it happens.

use spool_core::{ItemId, Status};
use spool_storage::{LockError, StoreError, TxError};
use thiserror::Error;

/// Failures from the storage layer, kept as the source of [`QueueError::Storage`]
#[derive(Debug, Error)]
pub enum StorageFailure {
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error(transparent)]
    Tx(#[from] TxError),
    /// The move failed and the transaction was rolled back
    #[error("status update rolled back: {0}")]
    RolledBack(StoreError),
}

impl StorageFailure {
    fn summary(&self) -> &'static str {
        match self {
            StorageFailure::Store(_) => "item store unavailable",
            StorageFailure::Lock(_) => "lock directory unavailable",
            StorageFailure::Tx(_) => "transaction log unavailable",
            StorageFailure::RolledBack(_) => "status update failed and was rolled back",
        }
    }
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("storage error: {}", .0.summary())]
    Storage(#[source] StorageFailure),
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("item {0} is locked by another operation")]
    LockTimeout(ItemId),
    #[error("cannot move item from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("item {0} is currently processing")]
    Conflict(ItemId),
}

impl QueueError {
    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::Storage(_) => "storage",
            QueueError::NotFound(_) => "not_found",
            QueueError::LockTimeout(_) => "lock_timeout",
            QueueError::InvalidTransition { .. } => "invalid_transition",
            QueueError::Conflict(_) => "conflict",
        }
    }
}

impl From<StoreError> for QueueError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => QueueError::NotFound(id),
            other => QueueError::Storage(StorageFailure::Store(other)),
        }
    }
}

impl From<LockError> for QueueError {
    fn from(e: LockError) -> Self {
        QueueError::Storage(e.into())
    }
}

impl From<TxError> for QueueError {
    fn from(e: TxError) -> Self {
        QueueError::Storage(e.into())
    }
}

/// Errors resolving or loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory (set SPOOL_STATE_DIR or HOME)")]
    NoStateDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
