//! Display status of the tracked run.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BatchRun, RunPhase};

/// Status label shown by display sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// No run has ever started.
    Idle,
    /// Active, nothing processed yet.
    Starting,
    /// Active with at least one accepted item.
    Processing,
    /// `complete()` was received.
    Complete,
    /// Stalled past the watchdog threshold.
    Failed,
}

impl RunStatus {
    /// Derives the status of an optional run.
    #[must_use]
    pub fn of(run: Option<&BatchRun>) -> Self {
        match run {
            None => Self::Idle,
            Some(run) => match run.phase {
                RunPhase::Completed => Self::Complete,
                RunPhase::Failed => Self::Failed,
                RunPhase::Active if run.processed_items == 0 => Self::Starting,
                RunPhase::Active => Self::Processing,
            },
        }
    }

    /// Returns the label text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Starting => "Starting",
            Self::Processing => "Processing",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert_eq!(RunStatus::of(None), RunStatus::Idle);

        let mut run = BatchRun::new(1, 3, 0);
        assert_eq!(RunStatus::of(Some(&run)), RunStatus::Starting);

        run.processed_items = 1;
        assert_eq!(RunStatus::of(Some(&run)), RunStatus::Processing);

        run.phase = RunPhase::Completed;
        assert_eq!(RunStatus::of(Some(&run)), RunStatus::Complete);

        run.phase = RunPhase::Failed;
        assert_eq!(RunStatus::of(Some(&run)).to_string(), "Failed");
    }
}
