// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness of the external worker process.
//!
//! The worker is a black box: spool never starts, stops or talks to it. It
//! only reads the PID file the worker advertises and probes that process
//! with signal 0.

use std::path::PathBuf;

/// What is known about the external worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    /// A PID was advertised but no such process exists
    Dead,
    /// No usable PID file
    Unknown,
}

spool_core::simple_display! {
    Liveness {
        Alive => "alive",
        Dead => "dead",
        Unknown => "unknown",
    }
}

pub trait WorkerProbe: Send + Sync {
    fn liveness(&self) -> Liveness;

    fn is_alive(&self) -> bool {
        self.liveness() == Liveness::Alive
    }
}

/// Probe backed by a PID file
#[derive(Debug, Clone)]
pub struct PidFileProbe {
    path: PathBuf,
}

impl PidFileProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_pid(&self) -> Option<i32> {
        let text = std::fs::read_to_string(&self.path).ok()?;
        match text.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => Some(pid),
            _ => {
                tracing::debug!(path = %self.path.display(), "ignoring malformed worker pid file");
                None
            }
        }
    }
}

impl WorkerProbe for PidFileProbe {
    fn liveness(&self) -> Liveness {
        match self.read_pid() {
            None => Liveness::Unknown,
            Some(pid) if pid_alive(pid) => Liveness::Alive,
            Some(_) => Liveness::Dead,
        }
    }
}

/// `kill(pid, 0)`: the process exists if the call succeeds or is refused
/// with EPERM.
#[cfg(unix)]
fn pid_alive(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn pid_alive(_pid: i32) -> bool {
    true
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorker;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Liveness, WorkerProbe};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Probe whose answer is set by the test
    #[derive(Debug, Clone)]
    pub struct FakeWorker {
        liveness: Arc<Mutex<Liveness>>,
    }

    impl Default for FakeWorker {
        fn default() -> Self {
            Self::new(Liveness::Unknown)
        }
    }

    impl FakeWorker {
        pub fn new(liveness: Liveness) -> Self {
            Self { liveness: Arc::new(Mutex::new(liveness)) }
        }

        pub fn set(&self, liveness: Liveness) {
            *self.liveness.lock() = liveness;
        }
    }

    impl WorkerProbe for FakeWorker {
        fn liveness(&self) -> Liveness {
            *self.liveness.lock()
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
