// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error exit code specs
//!
//! Each queue error kind maps to its own exit code.

use crate::prelude::*;

#[test]
fn unknown_item_exits_not_found() {
    let temp = Project::empty();
    temp.spool()
        .args(&["show", "itm-missing"])
        .exits_with(exit::NOT_FOUND)
        .stderr_has("itm-missing");
    temp.spool().args(&["advance", "itm-missing"]).exits_with(exit::NOT_FOUND);
}

#[test]
fn table_forbidden_move_exits_invalid_transition() {
    let temp = Project::empty();
    let id = temp.create("Skip");

    temp.spool()
        .args(&["move", &id, "completed"])
        .exits_with(exit::INVALID_TRANSITION)
        .stderr_has("cannot move item from pending to completed");
    assert_eq!(temp.show(&id)["status"], "pending");
}

#[test]
fn fresh_processing_item_exits_conflict() {
    let temp = Project::empty();
    let id = temp.create("Busy");
    temp.advance(&id, "processing");

    temp.spool()
        .args(&["advance", &id])
        .exits_with(exit::CONFLICT)
        .stderr_has("currently processing");
    assert_eq!(temp.show(&id)["status"], "processing");
}

#[test]
fn dead_worker_releases_processing_item() {
    let temp = Project::empty();
    let id = temp.create("Orphaned");
    temp.advance(&id, "processing");

    temp.dead_worker();

    temp.advance(&id, "completed");
}

#[test]
fn held_lock_exits_lock_timeout() {
    let temp = Project::empty();
    let id = temp.create("Locked");
    let record = json!({
        "item_id": id,
        "holder_id": "hld-other",
        "acquired_at_ms": now_ms(),
    });
    temp.file(&format!("locks/{id}.lock"), &record.to_string());

    temp.spool()
        .env("SPOOL_ACQUIRE_TIMEOUT_MS", "100")
        .args(&["advance", &id])
        .exits_with(exit::LOCK_TIMEOUT)
        .stderr_has("locked by another operation");
    assert_eq!(temp.show(&id)["status"], "pending");
}

#[test]
fn expired_lock_does_not_block() {
    let temp = Project::empty();
    let id = temp.create("Stale lock");
    let record = json!({
        "item_id": id,
        "holder_id": "hld-crashed",
        "acquired_at_ms": now_ms() - 45_000,
    });
    temp.file(&format!("locks/{id}.lock"), &record.to_string());

    temp.spool().env("SPOOL_ACQUIRE_TIMEOUT_MS", "1000").args(&["advance", &id]).passes();
    assert_eq!(temp.show(&id)["status"], "processing");
}
