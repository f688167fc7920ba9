// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: SPOOL_STATE_DIR > XDG_STATE_HOME/spool > ~/.local/state/spool
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("SPOOL_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("spool"));
    }
    let home = dirs::home_dir().ok_or(ConfigError::NoStateDir)?;
    Ok(home.join(".local/state/spool"))
}

/// Lock validity override (`SPOOL_LOCK_TTL_MS`)
pub fn lock_ttl() -> Option<Duration> {
    millis_var("SPOOL_LOCK_TTL_MS")
}

/// Lock acquisition timeout override (`SPOOL_ACQUIRE_TIMEOUT_MS`)
pub fn acquire_timeout() -> Option<Duration> {
    millis_var("SPOOL_ACQUIRE_TIMEOUT_MS")
}

fn millis_var(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
