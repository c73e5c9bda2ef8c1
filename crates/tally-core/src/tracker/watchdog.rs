//! Stall detection for runs whose worker stopped reporting.

use std::time::Duration;

use tracing::debug;

use super::LifecycleController;
use crate::domain::BatchRun;

/// Default inactivity threshold before a run is considered stalled.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Fails an active run once it has seen no activity for `timeout`.
///
/// The watchdog holds no state of its own; it is polled with the current
/// time, typically after each ingested event or from a UI tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallWatchdog {
    timeout: Duration,
}

impl StallWatchdog {
    /// Creates a watchdog with the given inactivity threshold.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The inactivity threshold.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true if `run` is active and idle for at least the threshold.
    #[must_use]
    pub fn is_stalled(&self, run: &BatchRun, now_ms: u64) -> bool {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        run.is_active() && now_ms.saturating_sub(run.last_activity_ms) >= timeout_ms
    }

    /// Fails the controller's run if it is stalled. Returns true if it did.
    pub fn check(&self, controller: &mut LifecycleController, now_ms: u64) -> bool {
        let stalled = controller
            .run()
            .is_some_and(|run| self.is_stalled(run, now_ms));
        if !stalled {
            return false;
        }
        debug!(timeout = ?self.timeout, "No activity within stall timeout");
        controller.fail()
    }
}

impl Default for StallWatchdog {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_TIMEOUT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::{ItemKey, ItemReport, RunPhase};

    #[test]
    fn test_idle_run_fails_after_timeout() {
        let watchdog = StallWatchdog::new(Duration::from_secs(10));
        let mut ctl = LifecycleController::new();
        ctl.start(5, 0);

        assert!(!watchdog.check(&mut ctl, 9_999));
        assert!(watchdog.check(&mut ctl, 10_000));
        assert_eq!(ctl.run().unwrap().phase, RunPhase::Failed);
    }

    #[test]
    fn test_activity_resets_inactivity_window() {
        let watchdog = StallWatchdog::new(Duration::from_secs(10));
        let mut ctl = LifecycleController::new();
        ctl.start(5, 0);
        ctl.record_item(ItemReport::new(ItemKey::explicit("a")), 8_000);

        assert!(!watchdog.check(&mut ctl, 15_000));
        assert!(watchdog.check(&mut ctl, 18_000));
    }

    #[test]
    fn test_completed_run_never_stalls() {
        let watchdog = StallWatchdog::new(Duration::from_secs(1));
        let mut ctl = LifecycleController::new();
        ctl.start(0, 0);
        ctl.complete(0);

        assert!(!watchdog.check(&mut ctl, 60_000));
    }

    #[test]
    fn test_no_run_is_not_stalled() {
        let mut ctl = LifecycleController::new();
        assert!(!StallWatchdog::default().check(&mut ctl, u64::MAX));
    }
}
