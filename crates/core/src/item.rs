// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue item records and their index projection.

use crate::clock::Clock;
use crate::id::ItemId;
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// Caller-defined job document.
///
/// Only `title` and `category` are read by the queue (for listing and
/// search). Everything else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Payload {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    crate::setters! {
        option { category: String }
    }

    /// Add an arbitrary job-specific field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Request to enqueue a new item
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub payload: Payload,
    /// Lower sorts first
    pub priority: i32,
}

impl NewItem {
    pub fn new(payload: Payload) -> Self {
        Self { payload, priority: 0 }
    }

    crate::setters! {
        set { priority: i32 }
    }
}

/// A unit of queued work as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: ItemId,
    pub status: Status,
    pub payload: Payload,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    /// Failed transitions that carried an error message
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default)]
    pub priority: i32,
    /// File stem of the backing file, stable across status moves
    pub storage_key: String,
}

impl QueueItem {
    /// Build a fresh pending item.
    pub fn new(id: ItemId, new: NewItem, clock: &impl Clock) -> Self {
        let now = clock.epoch_ms();
        Self {
            storage_key: id.to_string(),
            id,
            status: Status::Pending,
            payload: new.payload,
            created_at_ms: now,
            updated_at_ms: now,
            attempts: 0,
            last_error: None,
            priority: new.priority,
        }
    }

    /// Apply a status change in memory.
    ///
    /// An error message marks a failed attempt: it bumps `attempts` and
    /// replaces `last_error`.
    pub fn transition(&mut self, to: Status, error: Option<&str>, now_ms: u64) {
        self.status = to;
        self.updated_at_ms = now_ms;
        if let Some(msg) = error {
            self.attempts += 1;
            self.last_error = Some(msg.to_string());
        }
    }

    pub fn index_entry(&self) -> IndexEntry {
        IndexEntry::from(self)
    }
}

/// Denormalized projection of a [`QueueItem`] kept in the index file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: ItemId,
    pub storage_key: String,
    pub status: Status,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub priority: i32,
}

impl IndexEntry {
    /// Case-insensitive substring match against title and category.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.category.as_deref().is_some_and(|c| c.to_lowercase().contains(needle))
    }

    /// Listing order: priority first, then oldest first, then id for stability.
    pub fn sort_key(&self) -> (i32, u64, &str) {
        (self.priority, self.created_at_ms, self.id.as_str())
    }
}

impl From<&QueueItem> for IndexEntry {
    fn from(item: &QueueItem) -> Self {
        Self {
            id: item.id.clone(),
            storage_key: item.storage_key.clone(),
            status: item.status,
            title: item.payload.title.clone(),
            category: item.payload.category.clone(),
            created_at_ms: item.created_at_ms,
            updated_at_ms: item.updated_at_ms,
            attempts: item.attempts,
            priority: item.priority,
        }
    }
}

crate::builder! {
    pub struct QueueItemBuilder => QueueItem {
        into {
            id: ItemId = "itm-test",
            storage_key: String = "itm-test",
        }
        set {
            status: Status = Status::Pending,
            payload: Payload = Payload::new("test item"),
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
            attempts: u32 = 0,
            priority: i32 = 0,
        }
        option {
            last_error: String = None,
        }
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
