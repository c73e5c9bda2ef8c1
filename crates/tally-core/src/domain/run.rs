//! Aggregate state for one tracked batch run.

use serde::{Deserialize, Serialize};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Accepting items.
    Active,
    /// `complete()` was received. Counts are retained for display.
    Completed,
    /// The stall watchdog gave up on the run.
    Failed,
}

/// One execution of a tracked job.
///
/// This is a faithful record of what was observed: `processed_items` may
/// exceed a stale `total_items`. Clamping happens in the projection layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRun {
    /// Monotonically increasing run id.
    pub generation: u64,
    /// Expected number of items. Zero means unknown.
    pub total_items: u64,
    /// Number of distinct items accepted so far.
    pub processed_items: u64,
    /// Durations of accepted items that reported one, in acceptance order.
    pub item_durations: Vec<u64>,
    /// Start time in milliseconds since the Unix epoch.
    pub started_at_ms: Option<u64>,
    /// Time of the last state-changing event.
    pub last_activity_ms: u64,
    /// Lifecycle phase.
    pub phase: RunPhase,
}

impl BatchRun {
    /// Creates a fresh active run.
    #[must_use]
    pub const fn new(generation: u64, total_items: u64, now_ms: u64) -> Self {
        Self {
            generation,
            total_items,
            processed_items: 0,
            item_durations: Vec::new(),
            started_at_ms: Some(now_ms),
            last_activity_ms: now_ms,
            phase: RunPhase::Active,
        }
    }

    /// Returns true while the run accepts items.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == RunPhase::Active
    }

    /// Items still outstanding. Zero when the total is stale or unknown.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.total_items.saturating_sub(self.processed_items)
    }

    /// Milliseconds elapsed since the run started.
    #[must_use]
    pub fn elapsed_ms(&self, now_ms: u64) -> Option<u64> {
        self.started_at_ms.map(|start| now_ms.saturating_sub(start))
    }
}
