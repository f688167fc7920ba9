// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue configuration: paths and the timing constants.
//!
//! The lock TTL and the lock janitor age are separate knobs, as are the
//! stale-processing timeout and the transaction janitor age. Each pair is
//! related (the janitor must never be faster than the validity window it
//! cleans up after) and [`QueueConfig::validate`] enforces that, but one is
//! not derived from the other.

use crate::env;
use crate::error::ConfigError;
use serde::Deserialize;
use spool_storage::Layout;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use spool_storage::{ACQUIRE_POLL, LOCK_TTL};

/// Age at which the janitor deletes lock files
pub const LOCK_REAP_AGE: Duration = Duration::from_secs(60);
/// How long a processing item is assumed to belong to a live worker
pub const PROCESSING_STALE_TIMEOUT: Duration = Duration::from_secs(5 * 60);
/// Age at which the janitor deletes transaction records
pub const TX_REAP_AGE: Duration = Duration::from_secs(300);
/// How long an orchestrated move waits for the item lock
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub layout: Layout,
    pub lock_ttl: Duration,
    pub lock_reap_age: Duration,
    pub processing_stale_timeout: Duration,
    pub tx_reap_age: Duration,
    pub acquire_timeout: Duration,
    pub acquire_poll: Duration,
    /// PID file advertised by the external worker
    pub worker_pid_file: PathBuf,
}

/// `spool.toml`; every key optional, durations in milliseconds
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    lock_ttl_ms: Option<u64>,
    lock_reap_age_ms: Option<u64>,
    processing_stale_timeout_ms: Option<u64>,
    tx_reap_age_ms: Option<u64>,
    acquire_timeout_ms: Option<u64>,
    acquire_poll_ms: Option<u64>,
    worker_pid_file: Option<PathBuf>,
}

impl QueueConfig {
    /// Defaults for a queue rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let layout = Layout::new(root);
        let worker_pid_file = layout.worker_pid_path();
        Self {
            layout,
            lock_ttl: LOCK_TTL,
            lock_reap_age: LOCK_REAP_AGE,
            processing_stale_timeout: PROCESSING_STALE_TIMEOUT,
            tx_reap_age: TX_REAP_AGE,
            acquire_timeout: ACQUIRE_TIMEOUT,
            acquire_poll: ACQUIRE_POLL,
            worker_pid_file,
        }
    }

    spool_core::setters! {
        into { worker_pid_file: PathBuf }
        set {
            lock_ttl: Duration,
            lock_reap_age: Duration,
            processing_stale_timeout: Duration,
            tx_reap_age: Duration,
            acquire_timeout: Duration,
            acquire_poll: Duration,
        }
    }

    /// Defaults, then `spool.toml` in `root` if present, then environment
    /// overrides. The result is validated.
    pub fn load(root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::new(root);
        let path = config.layout.config_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => config = config.apply_file(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        config = config.apply_overrides(env::lock_ttl(), env::acquire_timeout());
        config.validate()?;
        tracing::debug!(
            root = %config.layout.root().display(),
            lock_ttl = ?config.lock_ttl,
            acquire_timeout = ?config.acquire_timeout,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Overlay the contents of a `spool.toml`.
    pub fn apply_file(mut self, text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let ms = Duration::from_millis;
        if let Some(v) = file.lock_ttl_ms {
            self.lock_ttl = ms(v);
        }
        if let Some(v) = file.lock_reap_age_ms {
            self.lock_reap_age = ms(v);
        }
        if let Some(v) = file.processing_stale_timeout_ms {
            self.processing_stale_timeout = ms(v);
        }
        if let Some(v) = file.tx_reap_age_ms {
            self.tx_reap_age = ms(v);
        }
        if let Some(v) = file.acquire_timeout_ms {
            self.acquire_timeout = ms(v);
        }
        if let Some(v) = file.acquire_poll_ms {
            self.acquire_poll = ms(v);
        }
        if let Some(path) = file.worker_pid_file {
            self.worker_pid_file = resolve(self.layout.root(), path);
        }
        Ok(self)
    }

    pub fn apply_overrides(mut self, lock_ttl: Option<Duration>, acquire_timeout: Option<Duration>) -> Self {
        if let Some(ttl) = lock_ttl {
            self.lock_ttl = ttl;
        }
        if let Some(timeout) = acquire_timeout {
            self.acquire_timeout = timeout;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lock_ttl.is_zero() {
            return Err(ConfigError::Invalid("lock_ttl must be positive".to_string()));
        }
        if self.acquire_poll.is_zero() {
            return Err(ConfigError::Invalid("acquire_poll must be positive".to_string()));
        }
        if self.lock_reap_age < self.lock_ttl {
            return Err(ConfigError::Invalid(format!(
                "lock_reap_age ({:?}) is shorter than lock_ttl ({:?})",
                self.lock_reap_age, self.lock_ttl
            )));
        }
        if self.tx_reap_age < self.processing_stale_timeout {
            return Err(ConfigError::Invalid(format!(
                "tx_reap_age ({:?}) is shorter than processing_stale_timeout ({:?})",
                self.tx_reap_age, self.processing_stale_timeout
            )));
        }
        Ok(())
    }
}

fn resolve(root: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
