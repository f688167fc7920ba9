// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintenance command handlers: reaping, pruning and crash recovery

use std::time::Duration;

use anyhow::Result;
use clap::{Subcommand, ValueEnum};

use spool_core::Status;
use spool_engine::{Queue, ReapReport};

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

/// Statuses whose items may be pruned
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TerminalStatus {
    Completed,
    Failed,
}

impl From<TerminalStatus> for Status {
    fn from(status: TerminalStatus) -> Self {
        match status {
            TerminalStatus::Completed => Status::Completed,
            TerminalStatus::Failed => Status::Failed,
        }
    }
}

#[derive(Subcommand)]
pub enum MaintenanceCommand {
    /// Delete expired lock files and stale transaction records
    Reap {
        /// Keep running, reaping every SECS seconds
        #[arg(long, value_name = "SECS")]
        every: Option<u64>,
        /// Lock files older than this are removed (default from config)
        #[arg(long, value_name = "SECS")]
        lock_age: Option<u64>,
        /// Transaction records older than this are removed (default from config)
        #[arg(long, value_name = "SECS")]
        tx_age: Option<u64>,
    },
    /// Delete completed or failed items last updated long ago
    Prune {
        /// completed or failed
        status: TerminalStatus,
        /// Minimum age since the last update
        #[arg(long, value_name = "SECS")]
        older_than: u64,
    },
    /// Roll back status changes interrupted by a crash
    Recover,
    /// Rebuild the index from the item files
    Fsck,
}

fn reap_once(
    queue: &Queue,
    lock_age: Option<Duration>,
    tx_age: Option<Duration>,
) -> Result<ReapReport> {
    if lock_age.is_none() && tx_age.is_none() {
        return Ok(queue.reap().map_err(ExitError::from)?);
    }
    let config = queue.config();
    let locks = queue
        .cleanup_expired_locks(lock_age.unwrap_or(config.lock_reap_age))
        .map_err(ExitError::from)?;
    let transactions = queue
        .cleanup_expired_transactions(tx_age.unwrap_or(config.tx_reap_age))
        .map_err(ExitError::from)?;
    Ok(ReapReport { locks, transactions })
}

fn print_reap(format: OutputFormat, report: &ReapReport) -> Result<()> {
    match format {
        // One object per line so `--every` output stays streamable
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
        OutputFormat::Text => println!(
            "Removed {} lock file{} and {} transaction record{}",
            report.locks,
            if report.locks == 1 { "" } else { "s" },
            report.transactions,
            if report.transactions == 1 { "" } else { "s" },
        ),
    }
    Ok(())
}

pub fn handle(command: MaintenanceCommand, queue: &Queue, format: OutputFormat) -> Result<()> {
    match command {
        MaintenanceCommand::Reap { every, lock_age, tx_age } => {
            let lock_age = lock_age.map(Duration::from_secs);
            let tx_age = tx_age.map(Duration::from_secs);
            let Some(interval) = every.map(Duration::from_secs) else {
                return print_reap(format, &reap_once(queue, lock_age, tx_age)?);
            };
            if interval.is_zero() {
                anyhow::bail!("--every must be at least 1 second");
            }
            loop {
                match reap_once(queue, lock_age, tx_age) {
                    Ok(report) => print_reap(format, &report)?,
                    // A failed pass is retried on the next tick
                    Err(e) => tracing::warn!(error = %e, "reap pass failed"),
                }
                std::thread::sleep(interval);
            }
        }
        MaintenanceCommand::Prune { status, older_than } => {
            let status = Status::from(status);
            let removed = queue
                .cleanup_older_than(status, Duration::from_secs(older_than))
                .map_err(ExitError::from)?;
            let result = serde_json::json!({ "status": status, "removed": removed });
            format_or_json(format, &result, || {
                println!(
                    "Pruned {} {} item{}",
                    removed,
                    status,
                    if removed == 1 { "" } else { "s" }
                );
            })?;
        }
        MaintenanceCommand::Recover => {
            let report = queue.recover_orphans().map_err(ExitError::from)?;
            format_or_json(format, &report, || {
                println!("Rolled back:    {}", report.rolled_back);
                println!("Superseded:     {}", report.superseded);
                println!("Skipped locked: {}", report.skipped_locked);
                println!("Unreadable:     {}", report.unreadable);
            })?;
        }
        MaintenanceCommand::Fsck => {
            let report = queue.rebuild_index().map_err(ExitError::from)?;
            format_or_json(format, &report, || {
                println!("Indexed:            {}", report.indexed);
                println!("Duplicates removed: {}", report.duplicates_removed);
                println!("Unreadable:         {}", report.unreadable);
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "maintenance_tests.rs"]
mod tests;
