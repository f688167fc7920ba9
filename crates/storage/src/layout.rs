// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk layout of a spool state directory.
//!
//! ```text
//! <root>/
//!   items/<status>/<storage_key>.json
//!   index.json
//!   index.lock
//!   locks/<item_id>.lock
//!   transactions/<transaction_id>.json
//!   spool.toml
//!   worker.pid
//! ```

use spool_core::Status;
use std::path::{Path, PathBuf};

/// Paths of one queue's state directory.
///
/// Passed explicitly to every component so tests can point each one at its
/// own temporary directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn items_dir(&self) -> PathBuf {
        self.root.join("items")
    }

    /// Directory holding the files of items currently in `status`
    pub fn partition_dir(&self, status: Status) -> PathBuf {
        self.items_dir().join(status.as_str())
    }

    pub fn item_path(&self, status: Status, storage_key: &str) -> PathBuf {
        self.partition_dir(status).join(format!("{storage_key}.json"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    pub fn index_lock_path(&self) -> PathBuf {
        self.root.join("index.lock")
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.root.join("locks")
    }

    pub fn transactions_dir(&self) -> PathBuf {
        self.root.join("transactions")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("spool.toml")
    }

    /// Default location of the external worker's PID file
    pub fn worker_pid_path(&self) -> PathBuf {
        self.root.join("worker.pid")
    }

    /// Create every directory in the layout.
    pub fn ensure(&self) -> std::io::Result<()> {
        for status in Status::ALL {
            std::fs::create_dir_all(self.partition_dir(status))?;
        }
        std::fs::create_dir_all(self.locks_dir())?;
        std::fs::create_dir_all(self.transactions_dir())?;
        Ok(())
    }
}
