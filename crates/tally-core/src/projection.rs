//! Derived read-only views over a run snapshot.
//!
//! Everything here is a pure function of a [`BatchRun`] and the current
//! time. Projections tolerate inconsistent state (a processed count above a
//! stale total, a missing start time) instead of rejecting it: percent is
//! capped at 100 and the ETA reports "almost done" rather than a negative
//! duration.

use serde::Serialize;

use crate::domain::{BatchRun, RunStatus};

/// ETA text shown when nothing is left but the run is not complete.
pub const ALMOST_DONE: &str = "Almost done…";

/// ETA text shown while throughput is still unknown.
pub const CALCULATING: &str = "Calculating…";

/// Derived progress figures for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Status label.
    pub status: RunStatus,
    /// Accepted items.
    pub processed: u64,
    /// Expected items, zero if unknown.
    pub total: u64,
    /// Items still outstanding, never negative.
    pub remaining: u64,
    /// Completion percentage, 0-100.
    pub percent: u8,
    /// Mean wall-clock time per accepted item.
    pub throughput_ms_per_item: Option<f64>,
    /// Estimated time to completion.
    pub eta_ms: Option<u64>,
}

impl Projection {
    /// Computes all projections for an optional run at `now_ms`.
    #[must_use]
    pub fn compute(run: Option<&BatchRun>, now_ms: u64) -> Self {
        let status = RunStatus::of(run);
        let Some(run) = run else {
            return Self {
                status,
                processed: 0,
                total: 0,
                remaining: 0,
                percent: 0,
                throughput_ms_per_item: None,
                eta_ms: None,
            };
        };

        let throughput = throughput_ms_per_item(run, now_ms);
        Self {
            status,
            processed: run.processed_items,
            total: run.total_items,
            remaining: run.remaining(),
            percent: percent(run.processed_items, run.total_items),
            throughput_ms_per_item: throughput,
            eta_ms: throughput.map(|t| eta_ms(t, run.remaining())),
        }
    }

    /// `"<processed>/<total>"`.
    #[must_use]
    pub fn counter_text(&self) -> String {
        format!("{}/{}", self.processed, self.total)
    }

    /// Human readable time remaining.
    #[must_use]
    pub fn eta_text(&self) -> String {
        match self.status {
            RunStatus::Idle => String::new(),
            RunStatus::Complete => "Done".to_string(),
            RunStatus::Failed => "Stalled".to_string(),
            _ => match self.eta_ms {
                None => CALCULATING.to_string(),
                Some(_) if self.remaining == 0 => ALMOST_DONE.to_string(),
                Some(ms) => format_duration(ms),
            },
        }
    }

    /// Human readable time per item, empty while unknown.
    #[must_use]
    pub fn throughput_text(&self) -> String {
        self.throughput_ms_per_item
            .map_or_else(String::new, format_throughput)
    }

    /// Flattens the projection into the strings display sinks render.
    #[must_use]
    pub fn display(&self) -> DisplayModel {
        DisplayModel {
            counter_text: self.counter_text(),
            percent: self.percent,
            status_label: self.status.as_str().to_string(),
            eta_text: self.eta_text(),
            throughput_text: self.throughput_text(),
        }
    }
}

/// What a display sink renders. Sinks keep no counters of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayModel {
    /// `"<processed>/<total>"`.
    pub counter_text: String,
    /// Completion percentage, 0-100.
    pub percent: u8,
    /// Status label.
    pub status_label: String,
    /// Time remaining.
    pub eta_text: String,
    /// Time per item.
    pub throughput_text: String,
}

/// Completion percentage, capped at 100. Zero when the total is unknown.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percent(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = processed.min(total) as f64;
    // Bounded to 0.0..=100.0 by the min above.
    (done / total as f64 * 100.0).round() as u8
}

/// Mean elapsed milliseconds per accepted item, `None` before the first item.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn throughput_ms_per_item(run: &BatchRun, now_ms: u64) -> Option<f64> {
    if run.processed_items == 0 {
        return None;
    }
    let elapsed = run.elapsed_ms(now_ms)?;
    Some(elapsed as f64 / run.processed_items as f64)
}

/// Estimated milliseconds to process `remaining` items.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn eta_ms(throughput_ms_per_item: f64, remaining: u64) -> u64 {
    (throughput_ms_per_item * remaining as f64).round().max(0.0) as u64
}

/// Formats a duration as `"Xm Ys"` from one minute up, `"Xs"` below.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    let secs = ms.saturating_add(500) / 1000;
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

fn format_throughput(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{ms:.0}ms/item")
    } else {
        format!("{:.1}s/item", ms / 1000.0)
    }
}
