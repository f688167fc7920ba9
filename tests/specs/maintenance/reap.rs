// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reap and prune specs

use crate::prelude::*;

fn write_lock(temp: &Project, id: &str, acquired_at_ms: u64) {
    let record = json!({ "item_id": id, "holder_id": "hld-gone", "acquired_at_ms": acquired_at_ms });
    temp.file(&format!("locks/{id}.lock"), &record.to_string());
}

#[test]
fn reap_removes_only_old_lock_files() {
    let temp = Project::empty();
    write_lock(&temp, "itm-old", now_ms() - 120_000);
    write_lock(&temp, "itm-recent", now_ms() - 45_000);

    let report = temp.spool().args(&["-o", "json", "reap"]).passes().json();
    assert_eq!(report, json!({"locks": 1, "transactions": 0}));
    assert!(!temp.exists("locks/itm-old.lock"));
    assert!(temp.exists("locks/itm-recent.lock"));
}

#[test]
fn reap_lock_age_can_be_overridden() {
    let temp = Project::empty();
    write_lock(&temp, "itm-recent", now_ms() - 45_000);

    temp.spool()
        .args(&["reap", "--lock-age", "30"])
        .passes()
        .stdout_eq("Removed 1 lock file and 0 transaction records\n");
    assert!(!temp.exists("locks/itm-recent.lock"));
}

#[test]
fn reap_on_empty_state_is_a_no_op() {
    let temp = Project::empty();
    temp.spool()
        .args(&["reap"])
        .passes()
        .stdout_eq("Removed 0 lock files and 0 transaction records\n");
}

#[test]
fn prune_removes_terminal_items_past_age() {
    let temp = Project::empty();
    let done = temp.create("Done");
    let pending = temp.create("Waiting");
    temp.spool().args(&["move", &done, "failed"]).passes();
    std::thread::sleep(std::time::Duration::from_millis(20));

    let result =
        temp.spool().args(&["-o", "json", "prune", "failed", "--older-than", "0"]).passes().json();
    assert_eq!(result["removed"], 1);

    temp.spool().args(&["show", &done]).exits_with(exit::NOT_FOUND);
    temp.show(&pending);
}

#[test]
fn prune_keeps_recent_items() {
    let temp = Project::empty();
    let id = temp.create("Fresh");
    temp.spool().args(&["move", &id, "failed"]).passes();

    temp.spool()
        .args(&["prune", "failed", "--older-than", "3600"])
        .passes()
        .stdout_eq("Pruned 0 failed items\n");
    assert_eq!(temp.show(&id)["status"], "failed");
}
