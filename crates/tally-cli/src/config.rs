//! Configuration file support for tally.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/tally/config.toml` (lowest priority)
//! - Project-local: `.tally.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Run tracking settings.
    pub tracking: TrackingConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Run tracking configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Enable/disable the stall watchdog.
    pub watchdog: Option<bool>,
    /// Seconds without activity before a run is marked failed.
    pub stall_timeout_secs: Option<u64>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/tally/config.toml`
    /// 2. Project-local: `.tally.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are logged as warnings.
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        let layers = [
            xdg_config_path(),
            cwd.as_deref().and_then(find_config_in_parents),
        ];

        let config = layers
            .into_iter()
            .flatten()
            .filter_map(|path| {
                if path.exists() {
                    info!("Loading config layer: {}", path.display());
                    load_file(&path)
                } else {
                    debug!("Config layer not found: {}", path.display());
                    None
                }
            })
            .fold(Self::default(), |mut base, layer| {
                base.merge(layer);
                base
            });

        for problem in config.problems() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Every out-of-range value, as a message naming the key.
    fn problems(&self) -> Vec<String> {
        self.tracking
            .validate()
            .into_iter()
            .chain(self.output.validate())
            .collect()
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        self.tracking.merge(other.tracking);
        self.output.merge(other.output);
    }
}

impl TrackingConfig {
    fn merge(&mut self, other: Self) {
        self.watchdog = other.watchdog.or(self.watchdog);
        self.stall_timeout_secs = other.stall_timeout_secs.or(self.stall_timeout_secs);
    }

    fn validate(&self) -> Option<String> {
        (self.stall_timeout_secs == Some(0))
            .then(|| "tracking.stall_timeout_secs must be greater than 0".to_string())
    }
}

impl OutputConfig {
    fn merge(&mut self, other: Self) {
        self.format = other.format.or_else(|| self.format.take());
        self.pretty = other.pretty.or(self.pretty);
        self.progress = other.progress.or(self.progress);
    }

    fn validate(&self) -> Option<String> {
        self.format
            .as_deref()
            .filter(|f| !matches!(*f, "json" | "jsonl"))
            .map(|f| format!("output.format must be 'json' or 'jsonl', got '{f}'"))
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tally").join("config.toml"))
}

/// Nearest `.tally.toml` in `start` or one of its ancestors.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".tally.toml"))
        .find(|candidate| candidate.is_file())
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| toml::from_str(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring config file {}: {e}", path.display());
            None
        }
    }
}
