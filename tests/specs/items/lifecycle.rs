// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Item lifecycle specs
//!
//! Create, advance around the full cycle, and move explicitly.

use crate::prelude::*;

#[test]
fn create_prints_id_and_stores_pending_item() {
    let temp = Project::empty();
    temp.spool()
        .args(&["create", "Scrape shop", "--category", "retail"])
        .passes()
        .stdout_has("Created item itm-");

    temp.spool()
        .args(&["list", "pending"])
        .passes()
        .stdout_has("Scrape shop")
        .stdout_has("[retail]");
}

#[test]
fn create_stores_payload_fields() {
    let temp = Project::empty();
    let out = temp
        .spool()
        .args(&[
            "-o", "json", "create", "Scrape", "--data", r#"{"pages": 3}"#, "--var", "shop=north",
            "--priority", "-2",
        ])
        .passes()
        .json();
    let id = out["id"].as_str().unwrap();

    let item = temp.show(id);
    assert_eq!(item["status"], "pending");
    assert_eq!(item["payload"]["title"], "Scrape");
    assert_eq!(item["payload"]["pages"], 3);
    assert_eq!(item["payload"]["shop"], "north");
    assert_eq!(item["priority"], -2);
    assert_eq!(item["attempts"], 0);
}

#[test]
fn advance_walks_the_full_cycle() {
    let temp = Project::empty();
    let id = temp.create("Cycle");
    temp.dead_worker();

    temp.advance(&id, "processing");
    temp.advance(&id, "completed");
    temp.advance(&id, "failed");
    temp.advance(&id, "pending");

    let item = temp.show(&id);
    assert_eq!(item["status"], "pending");
    assert_eq!(item["attempts"], 0);
}

#[test]
fn advance_text_output_names_both_statuses() {
    let temp = Project::empty();
    let id = temp.create("Text");
    temp.spool()
        .args(&["advance", &id])
        .passes()
        .stdout_eq(&format!("Advanced {id}: pending -> processing\n"));
}

#[test]
fn advance_leaves_one_file_and_no_lock() {
    let temp = Project::empty();
    let id = temp.create("Files");
    temp.advance(&id, "processing");

    let count = |status: &str| {
        std::fs::read_dir(temp.state_path(&format!("items/{status}"))).unwrap().count()
    };
    assert_eq!(count("pending"), 0);
    assert_eq!(count("processing"), 1);
    assert!(!temp.exists(&format!("locks/{id}.lock")));
    assert_eq!(std::fs::read_dir(temp.state_path("transactions")).unwrap().count(), 0);
}

#[test]
fn move_to_failed_records_error() {
    let temp = Project::empty();
    let id = temp.create("Broken");
    temp.advance(&id, "processing");

    temp.spool()
        .args(&["move", &id, "failed", "--error", "timeout"])
        .passes()
        .stdout_has("processing -> failed");

    let item = temp.show(&id);
    assert_eq!(item["status"], "failed");
    assert_eq!(item["last_error"], "timeout");
    assert_eq!(item["attempts"], 1);

    temp.spool().args(&["show", &id]).passes().stdout_has("Last error: timeout");
}

#[test]
fn failed_item_can_be_requeued() {
    let temp = Project::empty();
    let id = temp.create("Retry");
    temp.spool().args(&["move", &id, "failed"]).passes();
    temp.spool().args(&["move", &id, "pending"]).passes();

    assert_eq!(temp.show(&id)["status"], "pending");
}
