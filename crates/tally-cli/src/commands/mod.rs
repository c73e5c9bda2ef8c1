//! CLI command definitions and handlers.

pub mod replay;
pub mod validate;

use clap::{Parser, Subcommand};

/// Tally - Batch progress aggregation for worker event logs
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Shared replay arguments (logs, output, tracking flags).
    #[command(flatten)]
    pub replay: replay::ReplayArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Replay event logs and report batch progress
    Replay(replay::ReplayArgs),
    /// Check event logs for malformed lines
    Validate(validate::ValidateArgs),
}

/// Process exit status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// The run completed, or the logs were valid.
    #[default]
    Success = 0,
    /// The run did not complete, or the logs had malformed lines.
    IssuesFound = 1,
    /// The command could not run.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}
