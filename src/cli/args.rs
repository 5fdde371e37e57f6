//! CLI argument definitions using clap
//!
//! Commands:
//! - logkeep vacuum --table <path> [--dry-run] [--now <epoch-millis>]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// logkeep - deterministic log retention and cleanup for append-only
/// transactional table logs
#[derive(Parser, Debug)]
#[command(name = "logkeep")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run (or plan) one cleanup pass over a table's log directory
    Vacuum {
        /// Path to the table's log root
        #[arg(long)]
        table: PathBuf,

        /// Compute and print the cleanup plan without deleting or writing
        /// anything
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Override the current instant (epoch milliseconds) instead of
        /// using the system clock, for reproducible runs
        #[arg(long)]
        now: Option<i64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
