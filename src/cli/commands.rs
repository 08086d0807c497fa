//! CLI command implementations

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::cluster::RoleChanged;
use crate::failover::parse_notification;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Dispatch the parsed CLI to its command.
pub fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Tap { input } => tap(input.as_deref()),
    }
}

/// Read notification lines from `input` (or stdin), emit a role-changed
/// JSON line for each one that parses, drop the rest.
pub fn tap(input: Option<&Path>) -> CliResult<()> {
    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = File::open(path).map_err(|e| CliError::Input {
                path: path.display().to_string(),
                source: e,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in reader.lines() {
        let line = line?;
        if let Some(event) = parse_notification(&line) {
            let change = RoleChanged::new(&event.interface, event.kind.name());
            serde_json::to_writer(&mut out, &change)?;
            out.write_all(b"\n")?;
        }
    }
    out.flush()?;
    Ok(())
}
