// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{NewItem, Payload};

/// Proptest strategies for core types.
pub mod strategies {
    use crate::Status;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = Status> {
        prop_oneof![
            Just(Status::Pending),
            Just(Status::Processing),
            Just(Status::Completed),
            Just(Status::Failed),
        ]
    }
}

/// A new-item request with a title, category and one nested field.
pub fn new_item(title: &str) -> NewItem {
    NewItem::new(
        Payload::new(title)
            .category("general")
            .field("job", serde_json::json!({ "kind": "scrape", "retries": 2 })),
    )
}
