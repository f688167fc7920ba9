// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spool-core: pure types for the spool work-item queue

pub mod macros;

pub mod clock;
pub mod id;
pub mod item;
pub mod status;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{HolderId, ItemId, TransactionId};
#[cfg(any(test, feature = "test-support"))]
pub use item::QueueItemBuilder;
pub use item::{IndexEntry, NewItem, Payload, QueueItem};
pub use status::{next_status_of, ParseStatusError, Status, ADVANCE_CYCLE};
pub use time_fmt::{format_age_ms, format_elapsed};
