// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listing, search and stats specs

use crate::prelude::*;

#[test]
fn list_empty_status() {
    let temp = Project::empty();
    temp.spool().args(&["list", "failed"]).passes().stdout_eq("No failed items\n");
}

#[test]
fn list_orders_by_priority_and_honors_limit() {
    let temp = Project::empty();
    temp.spool().args(&["create", "Later", "--priority", "5"]).passes();
    temp.spool().args(&["create", "Sooner", "--priority", "1"]).passes();
    temp.spool().args(&["create", "Soonest", "--priority", "-1"]).passes();

    let entries = temp.spool().args(&["-o", "json", "list", "pending"]).passes().json();
    let titles: Vec<_> =
        entries.as_array().unwrap().iter().map(|e| e["title"].as_str().unwrap()).collect();
    assert_eq!(titles, ["Soonest", "Sooner", "Later"]);

    let limited = temp.spool().args(&["-o", "json", "list", "pending", "-n", "1"]).passes().json();
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[test]
fn list_only_shows_requested_status() {
    let temp = Project::empty();
    let id = temp.create("Moving");
    temp.create("Staying");
    temp.advance(&id, "processing");

    temp.spool()
        .args(&["list", "pending"])
        .passes()
        .stdout_has("Staying")
        .stdout_lacks("Moving");
}

#[test]
fn search_matches_title_and_category_case_insensitively() {
    let temp = Project::empty();
    temp.spool().args(&["create", "Scrape North", "--category", "retail"]).passes();
    temp.spool().args(&["create", "Index South", "--category", "RETAIL"]).passes();
    temp.spool().args(&["create", "Other"]).passes();

    let found = temp.spool().args(&["-o", "json", "search", "retail"]).passes().json();
    assert_eq!(found.as_array().unwrap().len(), 2);

    temp.spool()
        .args(&["search", "north"])
        .passes()
        .stdout_has("Scrape North")
        .stdout_lacks("Other");
    temp.spool().args(&["search", "nothing"]).passes().stdout_eq("No matching items\n");
}

#[test]
fn search_can_filter_by_status() {
    let temp = Project::empty();
    let id = temp.create("Job A");
    temp.create("Job B");
    temp.advance(&id, "processing");

    let found =
        temp.spool().args(&["-o", "json", "search", "job", "--status", "processing"]).passes().json();
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], id.as_str());
}

#[test]
fn stats_counts_every_status() {
    let temp = Project::empty();
    let a = temp.create("a");
    let b = temp.create("b");
    temp.create("c");
    temp.advance(&a, "processing");
    temp.spool().args(&["move", &b, "failed"]).passes();

    let stats = temp.spool().args(&["-o", "json", "stats"]).passes().json();
    assert_eq!(stats, json!({"pending": 1, "processing": 1, "completed": 0, "failed": 1}));

    temp.spool().args(&["stats"]).passes().stdout_has("total").stdout_has("3");
}
