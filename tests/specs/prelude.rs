// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by every spec.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{SystemTime, UNIX_EPOCH};

pub use serde_json::{json, Value};

/// Exit codes the CLI promises to scripts
pub mod exit {
    pub const GENERIC: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const LOCK_TIMEOUT: i32 = 3;
    pub const INVALID_TRANSITION: i32 = 4;
    pub const CONFLICT: i32 = 5;
}

/// `spool` with no state directory configured.
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// A throwaway queue state directory.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.state_path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.state_path(rel).exists()
    }

    /// `spool --state-dir <tempdir>`
    pub fn spool(&self) -> CliBuilder {
        let mut builder = CliBuilder::new();
        builder.cmd.arg("--state-dir").arg(self.path());
        builder
    }

    /// Create an item and return its ID.
    pub fn create(&self, title: &str) -> String {
        let out = self.spool().args(&["-o", "json", "create", title]).passes().json();
        out["id"].as_str().unwrap().to_string()
    }

    /// Full item record as stored.
    pub fn show(&self, id: &str) -> Value {
        self.spool().args(&["-o", "json", "show", id]).passes().json()
    }

    /// Point the worker PID file at a process that has already exited.
    pub fn dead_worker(&self) {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        self.file("worker.pid", &format!("{pid}\n"));
    }

    /// Advance `id` and assert the resulting status.
    pub fn advance(&self, id: &str, expected: &str) {
        let out = self.spool().args(&["-o", "json", "advance", id]).passes().json();
        assert_eq!(out["new_status"], expected, "advance of {id}");
    }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    fn new() -> Self {
        let mut cmd = assert_cmd::Command::cargo_bin("spool").unwrap();
        for var in ["SPOOL_STATE_DIR", "SPOOL_LOCK_TTL_MS", "SPOOL_ACQUIRE_TIMEOUT_MS", "SPOOL_LOG"] {
            cmd.env_remove(var);
        }
        cmd.env("NO_COLOR", "1");
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn run(mut self) -> RunAssert {
        RunAssert { output: self.cmd.output().unwrap() }
    }

    /// Run and assert exit code 0.
    pub fn passes(self) -> RunAssert {
        let run = self.run();
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            run.output.status.code(),
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and assert a non-zero exit code.
    pub fn fails(self) -> RunAssert {
        let run = self.run();
        assert!(
            !run.output.status.success(),
            "expected failure\nstdout: {}",
            run.stdout()
        );
        run
    }

    /// Run and assert a specific exit code.
    pub fn exits_with(self, code: i32) -> RunAssert {
        let run = self.run();
        assert_eq!(
            run.output.status.code(),
            Some(code),
            "stdout: {}\nstderr: {}",
            run.stdout(),
            run.stderr()
        );
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout missing {needle:?}:\n{stdout}");
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(!stdout.contains(needle), "stdout unexpectedly has {needle:?}:\n{stdout}");
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr missing {needle:?}:\n{stderr}");
        self
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.output.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout()))
    }
}
