// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index rebuild specs

use crate::prelude::*;

#[test]
fn fsck_rebuilds_a_lost_index() {
    let temp = Project::empty();
    let a = temp.create("Alpha");
    temp.create("Beta");
    temp.advance(&a, "processing");
    std::fs::remove_file(temp.state_path("index.json")).unwrap();

    let report = temp.spool().args(&["-o", "json", "fsck"]).passes().json();
    assert_eq!(report["indexed"], 2);

    let stats = temp.spool().args(&["-o", "json", "stats"]).passes().json();
    assert_eq!(stats["pending"], 1);
    assert_eq!(stats["processing"], 1);
}

#[test]
fn fsck_removes_duplicate_copies() {
    let temp = Project::empty();
    let id = temp.create("Twice");
    let key = temp.show(&id)["storage_key"].as_str().unwrap().to_string();
    temp.advance(&id, "processing");

    // Stale copy left behind in the old partition
    let mut stale = temp.show(&id);
    stale["status"] = json!("pending");
    stale["updated_at_ms"] = json!(1);
    temp.file(&format!("items/pending/{key}.json"), &stale.to_string());

    let report = temp.spool().args(&["-o", "json", "fsck"]).passes().json();
    assert_eq!(report["duplicates_removed"], 1);
    assert!(!temp.exists(&format!("items/pending/{key}.json")));
    assert_eq!(temp.show(&id)["status"], "processing");
}
