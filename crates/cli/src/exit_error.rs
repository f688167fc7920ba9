// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use spool_engine::{ConfigError, QueueError};
use std::fmt;

pub mod codes {
    pub const GENERIC: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const LOCK_TIMEOUT: i32 = 3;
    pub const INVALID_TRANSITION: i32 = 4;
    pub const CONFLICT: i32 = 5;
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<QueueError> for ExitError {
    fn from(e: QueueError) -> Self {
        let code = match &e {
            QueueError::Storage(_) => codes::GENERIC,
            QueueError::NotFound(_) => codes::NOT_FOUND,
            QueueError::LockTimeout(_) => codes::LOCK_TIMEOUT,
            QueueError::InvalidTransition { .. } => codes::INVALID_TRANSITION,
            QueueError::Conflict(_) => codes::CONFLICT,
        };
        if let QueueError::Storage(source) = &e {
            tracing::error!(error = %source, "storage failure");
        }
        Self::new(code, e.to_string())
    }
}

impl From<ConfigError> for ExitError {
    fn from(e: ConfigError) -> Self {
        Self::new(codes::GENERIC, e.to_string())
    }
}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
