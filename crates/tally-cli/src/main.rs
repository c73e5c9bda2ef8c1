//! Tally CLI - Replay worker event logs into batch progress.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::replay::ReplayArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = match cli.command {
        Some(Commands::Replay(args)) => replay(args),
        Some(Commands::Validate(ref args)) => match commands::validate::run(args) {
            Ok(report) => report.exit_code,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
        None => {
            // Default behavior: replay with flattened args
            if cli.replay.logs.is_empty() {
                eprintln!("error: No event logs specified. Use --help for usage information.");
                return ExitCode::Error.into();
            }
            replay(cli.replay)
        }
    };

    exit_code.into()
}

fn replay(args: ReplayArgs) -> ExitCode {
    let args = ReplayArgs::with_config(args, &AppConfig::load());
    match commands::replay::run(&args) {
        Ok(result) => result.exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::Error
        }
    }
}
