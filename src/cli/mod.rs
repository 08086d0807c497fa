//! CLI module for haven
//!
//! Provides the command-line surface:
//! - tap: parse VRRP state-change notifications from stdin or a file and
//!   emit role-changed events as JSON lines

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{run_command, tap};
pub use errors::{CliError, CliResult};

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli)
}
