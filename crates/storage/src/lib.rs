// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spool-storage: on-disk item store, per-item locks and the transaction log

mod error;
mod fsio;
mod index;
mod layout;
mod lock;
mod store;
mod txlog;

pub use error::{LockError, StoreError, TxError};
pub use index::{IndexFile, CURRENT_INDEX_VERSION};
pub use layout::Layout;
pub use lock::{LockGuard, LockManager, LockRecord, ACQUIRE_POLL, LOCK_TTL};
pub use store::{ItemStore, RebuildReport, Stats};
pub use txlog::{Backup, Transaction, TransactionLog, TxState};
