//! Replay command - feed event logs through the aggregation core.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use tally_adapters::{JsonlEventSource, SystemClock};
use tally_core::{
    Clock, DisplayModel, EventIngestor, EventSource, IngestOutcome, IngestStats, ResultOutput,
    RunSnapshot, RunStatus, StallWatchdog, DEFAULT_STALL_TIMEOUT,
};
use tracing::{debug, info, warn};

use super::ExitCode;
use crate::config::AppConfig;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

/// Parse and validate a stall timeout in seconds.
fn parse_timeout(s: &str) -> Result<u64, String> {
    let value: u64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a whole number of seconds"))?;
    if value == 0 {
        Err("stall timeout must be greater than 0".to_string())
    } else {
        Ok(value)
    }
}

/// Shared arguments for replaying event logs.
#[derive(Args, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ReplayArgs {
    /// JSON Lines event logs to replay (`-` reads stdin)
    pub logs: Vec<PathBuf>,

    /// Seconds without activity before a run is marked failed
    #[arg(long, value_name = "SECS", value_parser = parse_timeout)]
    pub stall_timeout: Option<u64>,

    /// Disable the stall watchdog
    #[arg(long)]
    pub no_watchdog: bool,

    /// Print only a final JSON summary instead of accepted items
    #[arg(long)]
    pub summary: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,
}

impl ReplayArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    pub fn with_config(mut args: Self, config: &AppConfig) -> Self {
        // CLI --no-watchdog always wins
        if !args.no_watchdog {
            if let Some(enabled) = config.tracking.watchdog {
                args.no_watchdog = !enabled;
            }
        }
        args.stall_timeout = args.stall_timeout.or(config.tracking.stall_timeout_secs);

        if args.format.is_none() {
            args.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        if !args.pretty {
            args.pretty = config.output.pretty.unwrap_or(false);
        }
        if !args.progress {
            args.progress = config.output.progress.unwrap_or(false);
        }

        args
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or(OutputFormat::Jsonl)
    }

    /// Get the stall watchdog, if enabled.
    fn watchdog(&self) -> Option<StallWatchdog> {
        if self.no_watchdog {
            return None;
        }
        let timeout = self
            .stall_timeout
            .map_or(DEFAULT_STALL_TIMEOUT, Duration::from_secs);
        Some(StallWatchdog::new(timeout))
    }
}

/// Final state of a replay, as printed by `--summary`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    /// Display strings for the final snapshot.
    #[serde(flatten)]
    pub display: DisplayModel,
    /// Generation of the final run, if any.
    pub generation: Option<u64>,
    /// Distinct items counted.
    pub processed: u64,
    /// Expected items.
    pub total: u64,
    /// Ingestion counters.
    pub stats: IngestStats,
    /// Log lines that could not be parsed.
    pub malformed: usize,
}

impl ReplaySummary {
    fn new(snapshot: &RunSnapshot, stats: IngestStats, malformed: usize) -> Self {
        Self {
            display: snapshot.projection.display(),
            generation: snapshot.run.as_ref().map(|run| run.generation),
            processed: snapshot.projection.processed,
            total: snapshot.projection.total,
            stats,
            malformed,
        }
    }
}

/// Result of running the replay command.
#[allow(dead_code)] // Fields exposed for programmatic use
pub struct ReplayResult {
    /// Final published snapshot.
    pub snapshot: Arc<RunSnapshot>,
    /// Ingestion counters.
    pub stats: IngestStats,
    /// Log lines that could not be parsed.
    pub malformed: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the replay command.
///
/// Expects `args` to have been processed through `with_config()` first
/// to apply configuration file settings.
pub fn run(args: &ReplayArgs) -> Result<ReplayResult> {
    info!("Replaying {} event log(s)", args.logs.len());

    if args.logs.is_empty() {
        anyhow::bail!("No event logs specified");
    }

    let source = JsonlEventSource::from_paths(&args.logs);
    if let Some(count) = source.count_hint() {
        debug!("Event logs hold {count} event line(s)");
    }

    let clock = Arc::new(SystemClock);

    // Determine if we should show progress
    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress = Arc::new(ProgressBar::new(args.quiet, show_progress));

    let output = Arc::new(match (args.summary, args.format()) {
        (false, OutputFormat::Json) => JsonOutput::stdout().array(args.pretty),
        _ => JsonOutput::stdout(),
    });

    let mut ingestor = EventIngestor::new(clock.clone());
    if !args.summary {
        ingestor = ingestor.with_output(output.clone());
    }
    if let Some(watchdog) = args.watchdog() {
        debug!("Stall watchdog after {:?}", watchdog.timeout());
        ingestor = ingestor.with_watchdog(watchdog);
    }
    ingestor.subscribe(progress.clone());

    let malformed = replay_events(&source, &mut ingestor, clock.as_ref(), !args.no_watchdog);

    let snapshot = ingestor.snapshot();
    let stats = ingestor.stats();

    if args.summary {
        output.write_value(&ReplaySummary::new(&snapshot, stats, malformed))?;
    }
    output.flush()?;
    progress.finish();

    if !args.quiet {
        eprintln!("{}", summary_line(&snapshot, stats, malformed));
    }

    let exit_code = exit_code_for(snapshot.projection.status);

    Ok(ReplayResult {
        snapshot,
        stats,
        malformed,
        exit_code,
    })
}

/// Feeds every event to the ingestor, skipping malformed lines.
///
/// Returns the number of skipped lines.
fn replay_events(
    source: &dyn EventSource,
    ingestor: &mut EventIngestor,
    clock: &dyn Clock,
    watch: bool,
) -> usize {
    let mut malformed = 0usize;

    for event in source.events() {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed event: {e:#}");
                malformed += 1;
                continue;
            }
        };

        // Recorded timestamps drive the watchdog so gaps in a log replay faithfully
        if watch {
            let now_ms = event.at.unwrap_or_else(|| clock.now_ms());
            if ingestor.tick_at(now_ms) {
                warn!("Run stalled before {} event", event.message.kind());
            }
        }

        match ingestor.ingest(event) {
            IngestOutcome::Stale { stamped, current } => {
                debug!("Dropped event from generation {stamped} (current {current})");
            }
            IngestOutcome::Ignored => debug!("Event had no effect"),
            _ => {}
        }
    }

    malformed
}

/// Complete runs and empty replays succeed; anything left unfinished does not.
const fn exit_code_for(status: RunStatus) -> ExitCode {
    match status {
        RunStatus::Idle | RunStatus::Complete => ExitCode::Success,
        RunStatus::Starting | RunStatus::Processing | RunStatus::Failed => ExitCode::IssuesFound,
    }
}

fn summary_line(snapshot: &RunSnapshot, stats: IngestStats, malformed: usize) -> String {
    let display = snapshot.projection.display();
    format!(
        "{}: {} ({}%), {} duplicate(s), {} stale, {} malformed line(s)",
        display.status_label,
        display.counter_text,
        display.percent,
        stats.duplicates,
        stats.stale,
        malformed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        replay: ReplayArgs,
    }

    fn parse(args: &[&str]) -> ReplayArgs {
        let mut argv = vec!["tally"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).replay
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("30"), Ok(30));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_cli_flags_win_over_config() {
        let config: AppConfig = toml::from_str(
            r"
[tracking]
stall_timeout_secs = 60

[output]
format = 'json'
",
        )
        .unwrap_or_default();

        let args = ReplayArgs::with_config(
            parse(&["--stall-timeout", "5", "--format", "jsonl", "run.jsonl"]),
            &config,
        );

        assert_eq!(args.stall_timeout, Some(5));
        assert!(matches!(args.format(), OutputFormat::Jsonl));
    }

    #[test]
    fn test_config_fills_unset_flags() {
        let config: AppConfig = toml::from_str(
            r"
[tracking]
watchdog = false

[output]
format = 'json'
pretty = true
",
        )
        .unwrap_or_default();

        let args = ReplayArgs::with_config(parse(&["run.jsonl"]), &config);

        assert!(args.no_watchdog);
        assert!(args.watchdog().is_none());
        assert!(args.pretty);
        assert!(matches!(args.format(), OutputFormat::Json));
    }

    #[test]
    fn test_default_watchdog_timeout() {
        let args = ReplayArgs::with_config(parse(&["run.jsonl"]), &AppConfig::default());
        assert_eq!(
            args.watchdog().map(|w| w.timeout()),
            Some(DEFAULT_STALL_TIMEOUT)
        );
    }

    #[test]
    fn test_exit_code_for_each_status() {
        assert_eq!(exit_code_for(RunStatus::Idle), ExitCode::Success);
        assert_eq!(exit_code_for(RunStatus::Complete), ExitCode::Success);
        assert_eq!(exit_code_for(RunStatus::Starting), ExitCode::IssuesFound);
        assert_eq!(exit_code_for(RunStatus::Processing), ExitCode::IssuesFound);
        assert_eq!(exit_code_for(RunStatus::Failed), ExitCode::IssuesFound);
    }
}
