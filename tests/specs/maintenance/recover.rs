// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash recovery specs
//!
//! A transaction record left behind by a crashed process is rolled back.

use crate::prelude::*;

/// Leave `id` moved to processing with an uncommitted record, as if the
/// process died between the move and the commit.
fn crash_after_move(temp: &Project, id: &str) {
    let before = temp.show(id);
    temp.advance(id, "processing");
    let record = json!({
        "id": "txn-crashed",
        "item_id": id,
        "action": "status_update",
        "backup": {
            "previous_status": "pending",
            "target_status": "processing",
            "previous_item": before,
        },
        "started_at_ms": now_ms() - 120_000,
        "state": "started",
    });
    temp.file("transactions/txn-crashed.json", &record.to_string());
}

#[test]
fn recover_restores_previous_status() {
    let temp = Project::empty();
    let id = temp.create("Interrupted");
    crash_after_move(&temp, &id);

    let report = temp.spool().args(&["-o", "json", "recover"]).passes().json();
    assert_eq!(report["rolled_back"], 1);

    assert_eq!(temp.show(&id)["status"], "pending");
    assert!(!temp.exists("transactions/txn-crashed.json"));
    temp.spool().args(&["list", "pending"]).passes().stdout_has("Interrupted");
    temp.spool().args(&["list", "processing"]).passes().stdout_eq("No processing items\n");
}

#[test]
fn recover_drops_records_the_item_has_moved_past() {
    let temp = Project::empty();
    let id = temp.create("Moved on");
    crash_after_move(&temp, &id);
    temp.spool().args(&["move", &id, "failed"]).passes();

    let report = temp.spool().args(&["-o", "json", "recover"]).passes().json();
    assert_eq!(report["superseded"], 1);
    assert_eq!(report["rolled_back"], 0);
    assert_eq!(temp.show(&id)["status"], "failed");
}

#[test]
fn recover_with_nothing_to_do() {
    let temp = Project::empty();
    temp.create("Clean");

    let report = temp.spool().args(&["-o", "json", "recover"]).passes().json();
    assert_eq!(
        report,
        json!({"rolled_back": 0, "superseded": 0, "skipped_locked": 0, "unreadable": 0})
    );
}
