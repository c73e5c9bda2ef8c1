//! Progress bar adapter using indicatif.

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use tally_core::{ProgressSink, RunSnapshot};

/// Progress bar adapter for CLI output.
///
/// Renders published snapshots only. It keeps no counters of its own, so it
/// always agrees with every other sink.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
}

impl ProgressBar {
    /// Creates a new progress bar.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, suppress all output
    /// * `show_bar` - If true, draw the bar; otherwise stay silent
    #[must_use]
    pub fn new(quiet: bool, show_bar: bool) -> Self {
        if quiet || !show_bar {
            return Self { bar: None };
        }

        let bar = IndicatifBar::new(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }

        Self { bar: Some(bar) }
    }

    /// Stops drawing, leaving the last message on screen.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}

impl ProgressSink for ProgressBar {
    fn on_update(&self, snapshot: &RunSnapshot) {
        let Some(bar) = &self.bar else {
            return;
        };

        let projection = &snapshot.projection;
        let display = projection.display();
        bar.set_length(projection.total);
        bar.set_position(projection.processed.min(projection.total));

        let message = format!(
            "{}: {} ({}%) {} {}",
            display.status_label,
            display.counter_text,
            display.percent,
            display.eta_text,
            display.throughput_text
        );
        bar.set_message(message.trim_end().to_string());
    }
}
