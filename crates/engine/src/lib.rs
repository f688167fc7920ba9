// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spool-engine: orchestrated status changes, maintenance and configuration

pub mod config;
pub mod env;
mod error;
mod maintenance;
mod queue;
pub mod worker;

pub use config::{
    QueueConfig, ACQUIRE_POLL, ACQUIRE_TIMEOUT, LOCK_REAP_AGE, LOCK_TTL, PROCESSING_STALE_TIMEOUT,
    TX_REAP_AGE,
};
pub use error::{ConfigError, QueueError, StorageFailure};
pub use maintenance::{ReapReport, RecoveryReport};
pub use queue::{Advance, Queue, STATUS_UPDATE};
#[cfg(any(test, feature = "test-support"))]
pub use worker::FakeWorker;
pub use worker::{Liveness, PidFileProbe, WorkerProbe};
