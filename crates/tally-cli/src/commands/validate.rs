//! Validate command - parse event logs without aggregating them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tally_adapters::JsonlEventSource;
use tally_core::EventSource;
use tracing::{info, warn};

use super::ExitCode;

/// Arguments for the validate command.
#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// JSON Lines event logs to check (`-` reads stdin)
    #[arg(required = true)]
    pub logs: Vec<PathBuf>,
}

/// Counts of what the logs contain.
#[derive(Debug, Default, Serialize)]
pub struct ValidateReport {
    /// Valid events by message kind.
    pub kinds: BTreeMap<&'static str, usize>,
    /// Events stamped with a generation.
    pub stamped: usize,
    /// Lines that could not be parsed.
    pub malformed: usize,
    /// Exit code.
    #[serde(skip)]
    pub exit_code: ExitCode,
}

/// Run the validate command.
pub fn run(args: &ValidateArgs) -> Result<ValidateReport> {
    info!("Validating {} event log(s)", args.logs.len());

    let report = tally(&JsonlEventSource::from_paths(&args.logs));
    println!("{}", serde_json::to_string(&report)?);

    Ok(report)
}

fn tally(source: &dyn EventSource) -> ValidateReport {
    let mut report = ValidateReport::default();

    for event in source.events() {
        match event {
            Ok(event) => {
                *report.kinds.entry(event.message.kind()).or_default() += 1;
                if event.generation.is_some() {
                    report.stamped += 1;
                }
            }
            Err(e) => {
                warn!("Malformed event: {e:#}");
                report.malformed += 1;
            }
        }
    }

    if report.malformed > 0 {
        report.exit_code = ExitCode::IssuesFound;
    }
    report
}
