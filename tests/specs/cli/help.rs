// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs

use crate::prelude::*;

#[test]
fn spool_no_args_prints_usage_and_fails() {
    cli().fails().stderr_has("Usage:");
}

#[test]
fn spool_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("create")
        .stdout_has("advance")
        .stdout_has("reap")
        .stdout_has("recover");
}

#[test]
fn spool_move_help_shows_error_flag() {
    cli().args(&["move", "--help"]).passes().stdout_has("--error");
}

#[test]
fn spool_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_status_is_a_usage_error() {
    let temp = Project::empty();
    temp.spool().args(&["list", "archived"]).fails().stderr_has("unknown status");
}

#[test]
fn prune_rejects_live_statuses() {
    let temp = Project::empty();
    temp.spool().args(&["prune", "pending", "--older-than", "1"]).fails();
}

#[test]
fn state_dir_comes_from_environment() {
    let temp = Project::empty();
    cli()
        .env("SPOOL_STATE_DIR", temp.path().to_str().unwrap())
        .args(&["create", "From env"])
        .passes();

    temp.spool().args(&["list", "pending"]).passes().stdout_has("From env");
}

#[test]
fn invalid_config_file_fails_with_generic_code() {
    let temp = Project::empty();
    temp.file("spool.toml", "lock_ttl_ms = 0\n");
    temp.spool().args(&["stats"]).exits_with(exit::GENERIC);
}
