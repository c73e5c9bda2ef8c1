//! Progress reporting port for display widgets.

use std::sync::Arc;

use crate::domain::BatchRun;
use crate::projection::Projection;

/// Immutable view of the tracked run published after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    /// Monotonic publication counter.
    pub revision: u64,
    /// Time the snapshot was taken, in milliseconds since the Unix epoch.
    pub at_ms: u64,
    /// The run, `None` while idle.
    pub run: Option<Arc<BatchRun>>,
    /// Projections computed at `at_ms`.
    pub projection: Projection,
}

impl RunSnapshot {
    /// Snapshot of a tracker that has never seen a run.
    #[must_use]
    pub fn idle(at_ms: u64) -> Self {
        Self {
            revision: 0,
            at_ms,
            run: None,
            projection: Projection::compute(None, at_ms),
        }
    }
}

/// Port for receiving change notifications.
///
/// Sinks render from the snapshot and must not keep counters of their own.
pub trait ProgressSink: Send + Sync {
    /// Called with each newly published snapshot.
    fn on_update(&self, snapshot: &RunSnapshot);
}
