// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item command handlers

use anyhow::Result;
use clap::Subcommand;
use serde_json::{Map, Value};

use spool_core::{ItemId, NewItem, Payload, QueueItem, Status};
use spool_engine::Queue;

use crate::color;
use crate::exit_error::ExitError;
use crate::output::{
    format_or_json, format_time_ago, format_timestamp, handle_list, write_entries, OutputFormat,
};

/// Payload keys owned by the item itself
const RESERVED_KEYS: [&str; 2] = ["title", "category"];

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Enqueue a new pending item
    Create {
        /// Item title
        title: String,
        /// Free-form category, matched by `search`
        #[arg(long)]
        category: Option<String>,
        /// Lower values are listed first
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
        /// Extra payload fields as a JSON object
        #[arg(long)]
        data: Option<String>,
        /// Extra payload fields (can be repeated: --var key=value)
        #[arg(long = "var", value_parser = parse_key_value)]
        var: Vec<(String, String)>,
    },
    /// Show one item
    Show {
        /// Item ID
        id: String,
    },
    /// List items in a status
    List {
        /// pending, processing, completed or failed
        status: Status,
        /// Show at most this many items
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Find items whose title or category contains a string
    Search {
        /// Case-insensitive substring
        query: String,
        /// Only search this status
        #[arg(long)]
        status: Option<Status>,
    },
    /// Move an item to the next status in the cycle
    Advance {
        /// Item ID
        id: String,
    },
    /// Move an item to a specific status
    Move {
        /// Item ID
        id: String,
        /// Target status
        status: Status,
        /// Failure reason recorded on the item
        #[arg(long)]
        error: Option<String>,
    },
    /// Item counts per status
    Stats,
}

pub(crate) fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos =
        s.find('=').ok_or_else(|| format!("invalid input format '{}': must be key=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Merge `--data` and `--var` into payload fields; `--var` wins on conflict.
fn build_fields(data: Option<String>, var: Vec<(String, String)>) -> Result<Map<String, Value>> {
    let mut map = match data {
        Some(json_str) => {
            let val: Value = serde_json::from_str(&json_str)
                .map_err(|e| anyhow::anyhow!("invalid JSON data: {}", e))?;
            match val {
                Value::Object(m) => m,
                _ => anyhow::bail!("JSON data must be an object"),
            }
        }
        None => Map::new(),
    };

    for (k, v) in var {
        map.insert(k, Value::String(v));
    }

    if let Some(key) = map.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
        anyhow::bail!("'{}' is set with its own flag, not as a payload field", key);
    }

    Ok(map)
}

fn print_item(item: &QueueItem) {
    println!("{} {}", color::header("Item:"), item.id);
    println!("  Status:     {}", color::status(item.status, item.status.as_str()));
    println!("  Title:      {}", item.payload.title);
    if let Some(category) = &item.payload.category {
        println!("  Category:   {}", category);
    }
    println!("  Priority:   {}", item.priority);
    println!("  Attempts:   {}", item.attempts);
    if let Some(error) = &item.last_error {
        println!("  Last error: {}", error);
    }
    println!(
        "  Created:    {} ({} ago)",
        format_timestamp(item.created_at_ms),
        format_time_ago(item.created_at_ms)
    );
    println!(
        "  Updated:    {} ({} ago)",
        format_timestamp(item.updated_at_ms),
        format_time_ago(item.updated_at_ms)
    );
    if !item.payload.fields.is_empty() {
        println!("  {}", color::header("Fields:"));
        for (key, value) in &item.payload.fields {
            match value {
                Value::String(s) => println!("    {}={}", key, s),
                other => println!("    {}={}", key, other),
            }
        }
    }
}

pub fn handle(command: ItemCommand, queue: &Queue, format: OutputFormat) -> Result<()> {
    match command {
        ItemCommand::Create { title, category, priority, data, var } => {
            let mut payload = Payload::new(title);
            payload.category = category;
            payload.fields = build_fields(data, var)?;
            let id = queue.create(NewItem::new(payload).priority(priority)).map_err(ExitError::from)?;
            format_or_json(format, &serde_json::json!({ "id": id }), || {
                println!("Created item {}", id);
            })?;
        }
        ItemCommand::Show { id } => {
            let item = queue.load(&ItemId::from_string(id)).map_err(ExitError::from)?;
            format_or_json(format, &item, || print_item(&item))?;
        }
        ItemCommand::List { status, limit } => {
            let entries = queue.list_by_status(status, limit).map_err(ExitError::from)?;
            handle_list(format, &entries, &format!("No {} items", status), write_entries)?;
        }
        ItemCommand::Search { query, status } => {
            let entries = queue.search(&query, status).map_err(ExitError::from)?;
            handle_list(format, &entries, "No matching items", write_entries)?;
        }
        ItemCommand::Advance { id } => {
            let advance =
                queue.process_advance(&ItemId::from_string(id)).map_err(ExitError::from)?;
            format_or_json(format, &advance, || {
                println!(
                    "Advanced {}: {} -> {}",
                    advance.item_id, advance.previous_status, advance.new_status
                );
            })?;
        }
        ItemCommand::Move { id, status, error } => {
            let advance = queue
                .move_item(&ItemId::from_string(id), status, error.as_deref())
                .map_err(ExitError::from)?;
            format_or_json(format, &advance, || {
                println!(
                    "Moved {}: {} -> {}",
                    advance.item_id, advance.previous_status, advance.new_status
                );
            })?;
        }
        ItemCommand::Stats => {
            let stats = queue.stats().map_err(ExitError::from)?;
            format_or_json(format, &stats, || {
                for status in Status::ALL {
                    println!("{:<11} {:>6}", status.as_str(), stats.get(status));
                }
                println!("{:<11} {:>6}", "total", stats.total());
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
