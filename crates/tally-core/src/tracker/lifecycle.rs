//! Lifecycle controller: the single writer of the aggregate run state.
//!
//! Every operation is idempotent or self-healing so that events arriving
//! late, early, or more than once converge on the same state:
//!
//! - a `start` for an already active run only updates the total
//! - an item arriving before any `start` bootstraps a run
//! - duplicate item ids are absorbed by the [`Deduplicator`]
//! - repeated `complete` calls are no-ops
//!
//! Nothing here fails. Anomalies are logged and degrade to a best-effort
//! update.

use tracing::{debug, info, warn};

use super::Deduplicator;
use crate::domain::{BatchRun, IdentitySource, ItemReport, ItemResult, RunPhase};

/// What `start` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new run was created.
    Started {
        /// Generation of the new run.
        generation: u64,
    },
    /// A run was already active; only its total changed.
    TotalUpdated {
        /// Generation of the active run.
        generation: u64,
    },
}

impl StartOutcome {
    /// Generation of the run the start applied to.
    #[must_use]
    pub const fn generation(self) -> u64 {
        match self {
            Self::Started { generation } | Self::TotalUpdated { generation } => generation,
        }
    }
}

/// What `record_item` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The item was new and has been counted.
    Accepted(ItemResult),
    /// The id was already accepted in this run.
    Duplicate,
}

/// Owns the current [`BatchRun`] and enforces the lifecycle rules over it.
#[derive(Debug, Default)]
pub struct LifecycleController {
    run: Option<BatchRun>,
    dedup: Deduplicator,
    last_generation: u64,
    warned_filename_identity: bool,
}

impl LifecycleController {
    /// Creates a controller with no run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current run, if any has ever started.
    #[must_use]
    pub const fn run(&self) -> Option<&BatchRun> {
        self.run.as_ref()
    }

    /// Generation of the most recent run, or 0 before the first run.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.last_generation
    }

    /// Handles an explicit start signal.
    ///
    /// If a run is already active its total is replaced and recorded
    /// progress is kept. Otherwise a new run begins.
    pub fn start(&mut self, total: u64, now_ms: u64) -> StartOutcome {
        if let Some(run) = self.run.as_mut().filter(|run| run.is_active()) {
            if run.total_items != total {
                debug!(
                    generation = run.generation,
                    from = run.total_items,
                    to = total,
                    "Start for active run, updating total in place"
                );
            }
            run.total_items = total;
            run.last_activity_ms = now_ms;
            return StartOutcome::TotalUpdated {
                generation: run.generation,
            };
        }

        let generation = self.last_generation + 1;
        self.begin(generation, total, now_ms);
        StartOutcome::Started { generation }
    }

    /// Replaces the current run with a new one of the given generation.
    ///
    /// Returns false and leaves state untouched if `generation` is not newer
    /// than every generation seen so far.
    pub fn supersede(&mut self, generation: u64, total: u64, now_ms: u64) -> bool {
        if generation <= self.last_generation {
            warn!(
                generation,
                current = self.last_generation,
                "Refusing to supersede with an older generation"
            );
            return false;
        }
        self.begin(generation, total, now_ms);
        true
    }

    fn begin(&mut self, generation: u64, total: u64, now_ms: u64) {
        if let Some(previous) = &self.run {
            debug!(
                previous = previous.generation,
                processed = previous.processed_items,
                "Superseding run"
            );
        }
        info!(generation, total, "Run started");
        self.last_generation = generation;
        if !self.dedup.is_empty() {
            debug!(forgotten = self.dedup.len(), "Clearing seen item ids");
        }
        self.dedup.clear();
        self.warned_filename_identity = false;
        self.run = Some(BatchRun::new(generation, total, now_ms));
    }

    /// Records one item event.
    ///
    /// Counts the item at most once per run. An item arriving before any
    /// start bootstraps a run with an unknown total. A total hint greater
    /// than zero is applied as [`Self::correct_total`], even for duplicates.
    pub fn record_item(&mut self, report: ItemReport, now_ms: u64) -> RecordOutcome {
        let ItemReport {
            key,
            duration_ms,
            total_hint,
        } = report;

        if !self.dedup.accept(&key.id) {
            debug!(id = %key.id, "Duplicate item ignored");
            if let Some(total) = total_hint {
                self.correct_total(total);
            }
            return RecordOutcome::Duplicate;
        }

        match key.source {
            IdentitySource::None => {
                debug!("Item without identity accepted without deduplication");
            }
            IdentitySource::FileName if !self.warned_filename_identity => {
                warn!(
                    id = %key.id,
                    "Deduplicating by filename; items sharing a name in different folders will collapse"
                );
                self.warned_filename_identity = true;
            }
            _ => {}
        }

        if self.run.is_none() {
            self.last_generation += 1;
            info!(
                generation = self.last_generation,
                "Item arrived before start, bootstrapping run"
            );
        }
        let generation = self.last_generation;
        let run = self
            .run
            .get_or_insert_with(|| BatchRun::new(generation, 0, now_ms));

        if run.phase == RunPhase::Failed {
            info!(generation = run.generation, "Activity resumed on failed run");
            run.phase = RunPhase::Active;
        }

        run.processed_items += 1;
        if let Some(duration) = duration_ms {
            run.item_durations.push(duration);
        }
        run.last_activity_ms = now_ms;

        let result = ItemResult {
            id: key.id,
            identity: key.source,
            received_at_ms: now_ms,
            duration_ms,
            generation: run.generation,
        };

        if let Some(total) = total_hint {
            self.correct_total(total);
        }

        RecordOutcome::Accepted(result)
    }

    /// Corrects the total of the current run.
    ///
    /// Ignored when `total` is zero, unchanged, or no run exists. Never
    /// touches the processed count. Returns true if the total changed.
    pub fn correct_total(&mut self, total: u64) -> bool {
        let Some(run) = self.run.as_mut() else {
            debug!(total, "Total correction before any run, ignored");
            return false;
        };
        if total == 0 || total == run.total_items {
            return false;
        }
        debug!(
            generation = run.generation,
            from = run.total_items,
            to = total,
            "Correcting total"
        );
        run.total_items = total;
        true
    }

    /// Marks the current run complete. Counts are kept for display.
    ///
    /// Returns true if the phase changed.
    pub fn complete(&mut self, now_ms: u64) -> bool {
        let Some(run) = self.run.as_mut() else {
            debug!("Complete before any run, ignored");
            return false;
        };
        if run.phase == RunPhase::Completed {
            debug!(generation = run.generation, "Repeated complete ignored");
            return false;
        }
        info!(
            generation = run.generation,
            processed = run.processed_items,
            total = run.total_items,
            "Run complete"
        );
        run.phase = RunPhase::Completed;
        run.last_activity_ms = now_ms;
        true
    }

    /// Marks an active run as failed. Used by the stall watchdog.
    ///
    /// Returns true if the phase changed.
    pub fn fail(&mut self) -> bool {
        match self.run.as_mut() {
            Some(run) if run.is_active() => {
                warn!(
                    generation = run.generation,
                    processed = run.processed_items,
                    "Run marked failed"
                );
                run.phase = RunPhase::Failed;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::ItemKey;

    fn item(id: &str) -> ItemReport {
        ItemReport::new(ItemKey::explicit(id))
    }

    fn processed(ctl: &LifecycleController) -> u64 {
        ctl.run().map_or(0, |r| r.processed_items)
    }

    #[test]
    fn test_start_creates_run() {
        let mut ctl = LifecycleController::new();
        let outcome = ctl.start(10, 100);

        assert_eq!(outcome, StartOutcome::Started { generation: 1 });
        let run = ctl.run().unwrap();
        assert_eq!(run.total_items, 10);
        assert_eq!(run.processed_items, 0);
        assert_eq!(run.started_at_ms, Some(100));
        assert!(run.is_active());
    }

    #[test]
    fn test_duplicate_start_keeps_progress() {
        let mut ctl = LifecycleController::new();
        ctl.start(10, 0);
        for id in ["a", "b", "c"] {
            ctl.record_item(item(id), 10);
        }

        let outcome = ctl.start(10, 20);

        assert_eq!(outcome, StartOutcome::TotalUpdated { generation: 1 });
        assert_eq!(processed(&ctl), 3);
        assert_eq!(ctl.run().unwrap().started_at_ms, Some(0));
    }

    #[test]
    fn test_late_start_updates_total_in_place() {
        let mut ctl = LifecycleController::new();
        ctl.record_item(item("a"), 0);
        ctl.record_item(item("b"), 5);

        ctl.start(8, 10);

        let run = ctl.run().unwrap();
        assert_eq!(run.total_items, 8);
        assert_eq!(run.processed_items, 2);
        assert_eq!(run.generation, 1);
    }

    #[test]
    fn test_record_same_id_twice_counts_once() {
        let mut ctl = LifecycleController::new();
        ctl.start(5, 0);

        assert!(matches!(
            ctl.record_item(item("a"), 1),
            RecordOutcome::Accepted(_)
        ));
        assert_eq!(ctl.record_item(item("a"), 2), RecordOutcome::Duplicate);
        assert_eq!(processed(&ctl), 1);
    }

    #[test]
    fn test_item_before_start_bootstraps() {
        let mut ctl = LifecycleController::new();
        let outcome = ctl.record_item(item("a").with_duration(40), 700);

        let RecordOutcome::Accepted(result) = outcome else {
            panic!("expected acceptance");
        };
        assert_eq!(result.generation, 1);
        assert_eq!(result.received_at_ms, 700);

        let run = ctl.run().unwrap();
        assert_eq!(run.started_at_ms, Some(700));
        assert_eq!(run.total_items, 0);
        assert_eq!(run.item_durations, vec![40]);

        assert!(ctl.correct_total(6));
        assert_eq!(ctl.run().unwrap().total_items, 6);
        assert_eq!(processed(&ctl), 1);
    }

    #[test]
    fn test_total_hint_corrects_total() {
        let mut ctl = LifecycleController::new();
        ctl.start(0, 0);

        ctl.record_item(item("a").with_total_hint(5), 1);
        assert_eq!(ctl.run().unwrap().total_items, 5);

        ctl.record_item(item("b").with_total_hint(0), 2);
        assert_eq!(ctl.run().unwrap().total_items, 5);
    }

    #[test]
    fn test_duplicate_still_applies_total_hint() {
        let mut ctl = LifecycleController::new();
        ctl.start(3, 0);
        ctl.record_item(item("a"), 1);

        ctl.record_item(item("a").with_total_hint(7), 2);

        assert_eq!(ctl.run().unwrap().total_items, 7);
        assert_eq!(processed(&ctl), 1);
    }

    #[test]
    fn test_correct_total_ignores_zero_and_missing_run() {
        let mut ctl = LifecycleController::new();
        assert!(!ctl.correct_total(4));

        ctl.start(4, 0);
        assert!(!ctl.correct_total(0));
        assert!(!ctl.correct_total(4));
        assert!(ctl.correct_total(3));
    }

    #[test]
    fn test_complete_is_idempotent_and_keeps_counts() {
        let mut ctl = LifecycleController::new();
        ctl.start(2, 0);
        ctl.record_item(item("a"), 1);

        assert!(ctl.complete(2));
        assert!(!ctl.complete(3));

        let run = ctl.run().unwrap();
        assert_eq!(run.phase, RunPhase::Completed);
        assert_eq!(run.processed_items, 1);
        assert_eq!(run.total_items, 2);
    }

    #[test]
    fn test_complete_with_zero_items() {
        let mut ctl = LifecycleController::new();
        ctl.start(0, 0);
        assert!(ctl.complete(1));
        assert_eq!(processed(&ctl), 0);
    }

    #[test]
    fn test_complete_without_run_is_ignored() {
        let mut ctl = LifecycleController::new();
        assert!(!ctl.complete(1));
        assert!(ctl.run().is_none());
    }

    #[test]
    fn test_start_after_complete_begins_new_run() {
        let mut ctl = LifecycleController::new();
        ctl.start(2, 0);
        ctl.record_item(item("a"), 1);
        ctl.complete(2);

        let outcome = ctl.start(4, 10);

        assert_eq!(outcome, StartOutcome::Started { generation: 2 });
        assert_eq!(processed(&ctl), 0);
        // Deduplicator is scoped to the run.
        assert!(matches!(
            ctl.record_item(item("a"), 11),
            RecordOutcome::Accepted(_)
        ));
    }

    #[test]
    fn test_supersede_requires_newer_generation() {
        let mut ctl = LifecycleController::new();
        ctl.start(1, 0);

        assert!(!ctl.supersede(1, 5, 1));
        assert!(ctl.supersede(3, 5, 1));
        assert_eq!(ctl.generation(), 3);
        assert_eq!(ctl.run().unwrap().total_items, 5);
    }

    #[test]
    fn test_fail_and_revive() {
        let mut ctl = LifecycleController::new();
        ctl.start(3, 0);
        ctl.record_item(item("a"), 1);

        assert!(ctl.fail());
        assert!(!ctl.fail());
        assert_eq!(ctl.run().unwrap().phase, RunPhase::Failed);

        ctl.record_item(item("b"), 5);
        let run = ctl.run().unwrap();
        assert!(run.is_active());
        assert_eq!(run.processed_items, 2);
    }

    #[test]
    fn test_empty_ids_are_never_deduplicated() {
        let mut ctl = LifecycleController::new();
        ctl.start(2, 0);
        let blank = ItemReport::new(ItemKey::resolve(None, None, ""));
        ctl.record_item(blank.clone(), 1);
        ctl.record_item(blank, 2);
        assert_eq!(processed(&ctl), 2);
    }
}
