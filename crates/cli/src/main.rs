// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! spool: command-line front end for the file-backed work-item queue

mod color;
mod commands;
mod exit_error;
mod logging;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use spool_engine::{Queue, QueueConfig};

use crate::commands::item::ItemCommand;
use crate::commands::maintenance::MaintenanceCommand;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "spool", version, about = "File-backed work-item queue", styles = color::styles())]
struct Cli {
    /// Queue state directory [default: $SPOOL_STATE_DIR, then $XDG_STATE_HOME/spool]
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Item(ItemCommand),
    #[command(flatten)]
    Maintenance(MaintenanceCommand),
}

fn open_queue(state_dir: Option<PathBuf>) -> Result<Queue> {
    let root = match state_dir {
        Some(dir) => dir,
        None => spool_engine::env::state_dir().map_err(ExitError::from)?,
    };
    let config = QueueConfig::load(root).map_err(ExitError::from)?;
    Ok(Queue::open(config).map_err(ExitError::from)?)
}

fn run(cli: Cli) -> Result<()> {
    let queue = open_queue(cli.state_dir)?;
    match cli.command {
        Commands::Item(command) => commands::item::handle(command, &queue, cli.output),
        Commands::Maintenance(command) => {
            commands::maintenance::handle(command, &queue, cli.output)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let guard = match logging::init(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            None
        }
    };

    let result = run(cli);
    // Flush buffered file logs before exiting
    drop(guard);

    if let Err(e) = result {
        let code = e.downcast_ref::<ExitError>().map_or(exit_error::codes::GENERIC, |e| e.code);
        eprintln!("error: {e:#}");
        std::process::exit(code);
    }
}
