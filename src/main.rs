// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Purges old messages from IMAP labels.
//!
//! Usage:
//!   labelpurge                         # Move old messages to the trash
//!   labelpurge --archive               # Archive them instead
//!   labelpurge --pretend --verbose     # Show what would happen
//!
//! Exit codes:
//!   0 - Run completed (individual message failures are reported, not fatal)
//!   1 - Bad configuration, no connection, rejected login or a missing label

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::exit;

use labelpurge::config::{SelectionStrategy, Settings};
use labelpurge::error::PurgeError;
use labelpurge::purge::{run_purge, RunOptions};

#[derive(Parser)]
#[command(name = "labelpurge", about = "Purge messages older than a per-label age from an IMAP mailbox")]
struct Cli {
    /// Configuration file (defaults to ~/.gmaillabelpurge)
    #[arg(long, short, env = "LABELPURGE_CONFIG")]
    config: Option<PathBuf>,

    /// Narrate progress
    #[arg(long, short)]
    verbose: bool,

    /// Dry run: report what would be done without changing anything
    #[arg(long, short)]
    pretend: bool,

    /// Archive messages instead of moving them to the trash
    #[arg(long, short)]
    archive: bool,

    /// How old messages are found (overrides the configuration)
    #[arg(long, value_enum)]
    strategy: Option<SelectionStrategy>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose || cli.pretend { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let settings = Settings::new(cli.config.as_deref()).unwrap_or_else(|err| {
        eprintln!("{}", err);
        exit(PurgeError::from(err).exit_code());
    });

    let options = RunOptions {
        pretend: cli.pretend,
        verbose: cli.verbose,
        archive: cli.archive,
        strategy: cli.strategy.unwrap_or(settings.purge.strategy),
    };

    match run_purge(&settings, options).await {
        Ok(report) => {
            info!(
                "Done: {} message(s) processed across {} label(s)",
                report.processed(),
                report.rules.len()
            );
            if !report.is_clean() {
                warn!(
                    "{} label(s) skipped, {} message(s) failed",
                    report.skipped_labels.len(),
                    report.failures.len()
                );
            }
        }
        Err(e) => {
            error!("{}", e);
            exit(e.exit_code());
        }
    }
}
