//! Command-line front end for the knowledge-tree store.
//!
//! # Responsibility
//! - Parse arguments and start file logging when a directory is given.
//! - Report failures on stderr with a non-zero exit code.

mod args;
mod commands;

use anyhow::{Context, Result};
use args::Cli;
use clap::Parser;
use knowtree_core::{init_logging, LogLevel};

fn main() {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli).and_then(|()| commands::execute(&cli)) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let Some(log_dir) = cli.log_dir.as_deref() else {
        return Ok(());
    };
    let level = match cli.log_level.as_deref() {
        Some(level) => level.parse::<LogLevel>()?,
        None => LogLevel::default_for_build(),
    };
    init_logging(level, log_dir)
        .with_context(|| format!("cannot start logging in {}", log_dir.display()))
}
