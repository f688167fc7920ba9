// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use spool_core::{Clock, IndexEntry, SystemClock};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a timestamp as relative time (e.g., "5s", "2m", "1h", "3d")
pub fn format_time_ago(epoch_ms: u64) -> String {
    spool_core::format_age_ms(epoch_ms, SystemClock.epoch_ms())
}

/// Absolute UTC time of an epoch-ms timestamp
pub fn format_timestamp(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Render a list as text table or JSON. Handles empty check + format branch.
pub fn handle_list<T: Serialize>(
    format: OutputFormat,
    items: &[T],
    empty_msg: &str,
    render_text: impl FnOnce(&[T], &mut dyn Write) -> std::io::Result<()>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty_msg);
            } else {
                render_text(items, &mut std::io::stdout().lock())?;
            }
        }
    }
    Ok(())
}

/// Format-branch helper for non-list commands (show, advance, etc.).
///
/// Renders as JSON when `format` is `Json`, otherwise calls `text_fn`.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Item table: one row per index entry.
pub fn write_entries(entries: &[IndexEntry], out: &mut dyn Write) -> std::io::Result<()> {
    let id_width = entries.iter().map(|e| e.id.len()).max().unwrap_or(2).max(2);
    let header = format!(
        "{:<id_width$}  {:<10}  {:>4}  {:>8}  {:>7}  TITLE",
        "ID", "STATUS", "PRIO", "ATTEMPTS", "UPDATED"
    );
    writeln!(out, "{}", crate::color::header(&header))?;
    for entry in entries {
        let title = match &entry.category {
            Some(category) => format!("{} {}", entry.title, crate::color::muted(&format!("[{category}]"))),
            None => entry.title.clone(),
        };
        writeln!(
            out,
            "{:<id_width$}  {}  {:>4}  {:>8}  {:>7}  {}",
            entry.id.as_str(),
            crate::color::status(entry.status, &format!("{:<10}", entry.status.as_str())),
            entry.priority,
            entry.attempts,
            format_time_ago(entry.updated_at_ms),
            title,
        )?;
    }
    Ok(())
}
