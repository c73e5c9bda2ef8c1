//! Applies boundary messages to the lifecycle controller.
//!
//! Messages are applied as soon as they arrive: no buffering, no
//! resequencing. Ordering anomalies are absorbed by the controller's
//! idempotency rules and by the generation gate below.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::{InboundEvent, WorkerMessage};
use crate::domain::{BatchRun, ItemResult};
use crate::ports::{Clock, ProgressSink, ResultOutput, RunSnapshot};
use crate::store::ProgressStore;
use crate::tracker::{LifecycleController, RecordOutcome, StallWatchdog, StartOutcome};

/// What happened to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new run began.
    Started {
        /// Generation of the new run.
        generation: u64,
    },
    /// A start for the active run replaced its total.
    TotalUpdated {
        /// Generation of the active run.
        generation: u64,
    },
    /// An item was counted.
    Accepted(ItemResult),
    /// An item id was already counted in this run.
    Duplicate,
    /// A progress message was applied as a total correction.
    Progress {
        /// Whether the total changed.
        changed: bool,
    },
    /// The run was marked complete.
    Completed,
    /// The event was valid but had nothing to act on.
    Ignored,
    /// The event belongs to an older run and was dropped.
    Stale {
        /// Generation stamped on the event.
        stamped: u64,
        /// Generation of the current run.
        current: u64,
    },
}

/// Counters describing what the ingestor has seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Events received.
    pub received: u64,
    /// Items counted.
    pub accepted: u64,
    /// Items rejected as duplicates.
    pub duplicates: u64,
    /// Events dropped for belonging to another generation.
    pub stale: u64,
    /// Accepted items the result output failed to take.
    pub output_errors: u64,
}

enum Gate {
    Apply,
    Advance(u64),
    Stale(u64),
}

/// Entry point for boundary messages.
///
/// Owns the single writer ([`LifecycleController`]) and the observable
/// [`ProgressStore`]. Every applied event publishes a new snapshot.
pub struct EventIngestor {
    controller: LifecycleController,
    store: ProgressStore,
    clock: Arc<dyn Clock>,
    output: Option<Arc<dyn ResultOutput>>,
    watchdog: Option<StallWatchdog>,
    stats: IngestStats,
}

impl EventIngestor {
    /// Creates an ingestor reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let store = ProgressStore::new(clock.now_ms());
        Self {
            controller: LifecycleController::new(),
            store,
            clock,
            output: None,
            watchdog: None,
            stats: IngestStats::default(),
        }
    }

    /// Forwards every accepted item to `output`.
    #[must_use]
    pub fn with_output(mut self, output: Arc<dyn ResultOutput>) -> Self {
        self.output = Some(output);
        self
    }

    /// Enables stall detection on [`Self::tick`].
    #[must_use]
    pub const fn with_watchdog(mut self, watchdog: StallWatchdog) -> Self {
        self.watchdog = Some(watchdog);
        self
    }

    /// Registers a display sink.
    pub fn subscribe(&mut self, sink: Arc<dyn ProgressSink>) {
        self.store.subscribe(sink);
        debug!(sinks = self.store.subscriber_count(), "Progress sink subscribed");
    }

    /// The current run.
    #[must_use]
    pub const fn run(&self) -> Option<&BatchRun> {
        self.controller.run()
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RunSnapshot> {
        self.store.snapshot()
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Applies one event and publishes the resulting snapshot.
    pub fn ingest(&mut self, event: InboundEvent) -> IngestOutcome {
        let now_ms = event.at.unwrap_or_else(|| self.clock.now_ms());
        self.stats.received += 1;

        let outcome = match self.gate(event.generation) {
            Gate::Stale(stamped) => {
                let current = self.controller.generation();
                debug!(
                    kind = event.message.kind(),
                    stamped, current, "Dropping event from superseded run"
                );
                self.stats.stale += 1;
                return IngestOutcome::Stale { stamped, current };
            }
            Gate::Advance(generation) => self.advance(generation, event.message, now_ms),
            Gate::Apply => self.apply(event.message, event.generation.is_some(), now_ms),
        };

        match &outcome {
            IngestOutcome::Accepted(result) => {
                self.stats.accepted += 1;
                self.forward(result);
            }
            IngestOutcome::Duplicate => self.stats.duplicates += 1,
            _ => {}
        }

        self.store.publish(self.controller.run(), now_ms);
        outcome
    }

    /// Runs the stall watchdog at the clock's current time.
    ///
    /// Returns true if the run was failed. Publishes a fresh snapshot either
    /// way so time-based projections stay current.
    pub fn tick(&mut self) -> bool {
        let now_ms = self.clock.now_ms();
        self.tick_at(now_ms)
    }

    /// Runs the stall watchdog at an explicit time.
    pub fn tick_at(&mut self, now_ms: u64) -> bool {
        let failed = self
            .watchdog
            .is_some_and(|watchdog| watchdog.check(&mut self.controller, now_ms));
        self.store.publish(self.controller.run(), now_ms);
        failed
    }

    fn gate(&self, stamp: Option<u64>) -> Gate {
        let current = self.controller.generation();
        match stamp {
            Some(g) if g < current => Gate::Stale(g),
            Some(g) if g > current => Gate::Advance(g),
            _ => Gate::Apply,
        }
    }

    /// Handles an event stamped with a generation newer than any seen.
    fn advance(&mut self, generation: u64, message: WorkerMessage, now_ms: u64) -> IngestOutcome {
        if let WorkerMessage::Start { total_files } = message {
            self.controller.supersede(generation, total_files, now_ms);
            return IngestOutcome::Started { generation };
        }
        debug!(
            generation,
            kind = message.kind(),
            "Event from a newer run arrived before its start"
        );
        self.controller.supersede(generation, 0, now_ms);
        self.apply(message, true, now_ms)
    }

    fn apply(&mut self, message: WorkerMessage, stamped: bool, now_ms: u64) -> IngestOutcome {
        match message {
            WorkerMessage::Start { total_files } => {
                // A stamped start for a run that already finished is a late
                // duplicate, not a request for a new run.
                if stamped && !self.controller.run().is_some_and(BatchRun::is_active) {
                    debug!("Start for finished generation ignored");
                    return IngestOutcome::Ignored;
                }
                match self.controller.start(total_files, now_ms) {
                    StartOutcome::Started { generation } => IngestOutcome::Started { generation },
                    StartOutcome::TotalUpdated { generation } => {
                        IngestOutcome::TotalUpdated { generation }
                    }
                }
            }
            WorkerMessage::Item { .. } => {
                let Some(report) = message.item_report() else {
                    return IngestOutcome::Ignored;
                };
                match self.controller.record_item(report, now_ms) {
                    RecordOutcome::Accepted(result) => IngestOutcome::Accepted(result),
                    RecordOutcome::Duplicate => IngestOutcome::Duplicate,
                }
            }
            WorkerMessage::Progress { current, total } => {
                if let Some(run) = self.controller.run() {
                    if run.processed_items != current {
                        debug!(
                            reported = current,
                            counted = run.processed_items,
                            "Worker count differs from deduplicated count"
                        );
                    }
                }
                IngestOutcome::Progress {
                    changed: self.controller.correct_total(total),
                }
            }
            WorkerMessage::Complete => {
                if self.controller.complete(now_ms) {
                    IngestOutcome::Completed
                } else {
                    IngestOutcome::Ignored
                }
            }
        }
    }

    fn forward(&mut self, result: &ItemResult) {
        let Some(output) = &self.output else {
            return;
        };
        if let Err(e) = output.write(result) {
            warn!(id = %result.id, "Result output rejected item: {e:#}");
            self.stats.output_errors += 1;
        }
    }
}

impl fmt::Debug for EventIngestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventIngestor")
            .field("controller", &self.controller)
            .field("store", &self.store)
            .field("watchdog", &self.watchdog)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
