//! JSON Lines event log adapter.
//!
//! Each non-blank line is one [`InboundEvent`]. Lines starting with `#` are
//! comments. Malformed lines are yielded as errors so the caller can skip
//! them and keep going.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tally_core::{EventSource, InboundEvent};
use tracing::{debug, warn};

/// Where to read an event log from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogInput {
    /// Standard input.
    Stdin,
    /// A file on disk.
    File(PathBuf),
}

impl LogInput {
    /// Interprets a command-line path. `-` means standard input.
    #[must_use]
    pub fn from_arg(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

impl fmt::Display for LogInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Event source reading one or more JSON Lines logs in order.
pub struct JsonlEventSource {
    inputs: Vec<LogInput>,
}

impl JsonlEventSource {
    /// Creates a source over the given inputs.
    #[must_use]
    pub const fn new(inputs: Vec<LogInput>) -> Self {
        Self { inputs }
    }

    /// Creates a source from command-line paths.
    #[must_use]
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        Self::new(paths.iter().map(|p| LogInput::from_arg(p)).collect())
    }
}

impl EventSource for JsonlEventSource {
    fn events(&self) -> Box<dyn Iterator<Item = Result<InboundEvent>> + Send + '_> {
        debug!("Reading {} event log(s)", self.inputs.len());
        Box::new(self.inputs.iter().flat_map(read_input))
    }

    fn count_hint(&self) -> Option<usize> {
        let mut count = 0;
        for input in &self.inputs {
            let LogInput::File(path) = input else {
                return None;
            };
            if path.is_dir() {
                continue;
            }
            let Ok(file) = File::open(path) else {
                continue;
            };
            count += BufReader::new(file)
                .lines()
                .map_while(io::Result::ok)
                .filter(|line| is_event_line(line))
                .count();
        }
        Some(count)
    }
}

type EventIter = Box<dyn Iterator<Item = Result<InboundEvent>> + Send>;

fn read_input(input: &LogInput) -> EventIter {
    let reader: Box<dyn BufRead + Send> = match input {
        LogInput::Stdin => Box::new(BufReader::new(io::stdin())),
        LogInput::File(path) => {
            if !path.exists() {
                warn!("Event log does not exist: {}", path.display());
                return Box::new(std::iter::empty());
            }
            if path.is_dir() {
                warn!("Event log is a directory, skipping: {}", path.display());
                return Box::new(std::iter::empty());
            }
            match File::open(path)
                .with_context(|| format!("Failed to open event log: {}", path.display()))
            {
                Ok(file) => Box::new(BufReader::new(file)),
                Err(e) => return Box::new(std::iter::once(Err(e))),
            }
        }
    };

    let label = input.to_string();
    let mut unreadable = false;
    Box::new(
        reader
            .lines()
            .enumerate()
            // A read error ends this input; retrying the reader would fail forever.
            .map_while(move |(index, line)| {
                if unreadable {
                    return None;
                }
                let line_no = index + 1;
                Some(match line {
                    Ok(line) => parse_line(&line)
                        .map(|parsed| parsed.with_context(|| format!("{label}:{line_no}"))),
                    Err(e) => {
                        unreadable = true;
                        Some(Err(e).with_context(|| format!("Failed to read {label}:{line_no}")))
                    }
                })
            })
            .flatten(),
    )
}

fn is_event_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Parses one log line. Returns `None` for blank and comment lines.
///
/// # Errors
///
/// The inner result is an error if the line is not a valid event.
#[must_use]
pub fn parse_line(line: &str) -> Option<Result<InboundEvent>> {
    if !is_event_line(line) {
        return None;
    }
    Some(serde_json::from_str(line.trim()).context("Invalid event"))
}
