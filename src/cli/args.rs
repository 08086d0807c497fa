//! CLI argument definitions using clap
//!
//! Commands:
//! - haven tap [--input <path>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// haven - failover core for a two-node active/passive storage cluster
#[derive(Parser, Debug)]
#[command(name = "haven")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse VRRP state-change notifications and emit role-changed events
    /// as JSON lines
    Tap {
        /// Read notifications from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
