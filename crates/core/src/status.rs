// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item status and the transition rules between statuses.
//!
//! There is no terminal status: completed and failed items can be sent back
//! to pending. Two independent rules decide whether a move is legal:
//!
//! - a fixed advance cycle `pending → processing → completed → failed →
//!   pending`, used by the "advance" action, and
//! - a base transition table listing every other move callers may request.
//!
//! [`Status::is_transition_allowed`] accepts a move if *either* rule allows
//! it. Both rules are kept even where they overlap so that a change to one
//! cannot silently narrow what the other permits.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Processing,
    Completed,
    Failed,
}

crate::simple_display! {
    Status {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Order of the advance cycle; `next_in_cycle` wraps from the last entry.
pub const ADVANCE_CYCLE: [Status; 4] =
    [Status::Pending, Status::Processing, Status::Completed, Status::Failed];

impl Status {
    /// Every status, in advance-cycle order.
    pub const ALL: [Status; 4] = ADVANCE_CYCLE;

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Processing => "processing",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    /// Targets permitted by the base transition table.
    pub fn allowed_targets(self) -> &'static [Status] {
        match self {
            Status::Pending => &[Status::Processing, Status::Failed],
            Status::Processing => &[Status::Completed, Status::Failed, Status::Pending],
            Status::Completed => &[Status::Failed, Status::Pending],
            Status::Failed => &[Status::Pending],
        }
    }

    /// Next status in the advance cycle, wrapping from failed to pending.
    pub fn next_in_cycle(self) -> Status {
        let pos = ADVANCE_CYCLE.iter().position(|s| *s == self).unwrap_or(0);
        ADVANCE_CYCLE[(pos + 1) % ADVANCE_CYCLE.len()]
    }

    /// Target of the "advance" action.
    pub fn next_status(self) -> Status {
        self.next_in_cycle()
    }

    /// Whether the table alone permits `self → to`.
    pub fn table_allows(self, to: Status) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// Whether moving from `self` to `to` is legal under either rule.
    pub fn is_transition_allowed(self, to: Status) -> bool {
        to == self.next_in_cycle() || self.table_allows(to)
    }

    /// Whether items in this status are eligible for age-based pruning.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

/// Target of the "advance" action for a raw, possibly unrecognised status.
///
/// Unknown statuses restart the cycle at pending.
pub fn next_status_of(raw: &str) -> Status {
    raw.parse::<Status>().map(Status::next_status).unwrap_or(Status::Pending)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status '{0}' (expected pending, processing, completed or failed)")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Status::Pending),
            "processing" => Ok(Status::Processing),
            "completed" => Ok(Status::Completed),
            "failed" => Ok(Status::Failed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
