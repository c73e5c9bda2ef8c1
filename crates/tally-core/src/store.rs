//! Observable store of run snapshots.
//!
//! The store replaces shared mutable counters read by several widgets: it
//! holds the latest immutable [`RunSnapshot`] and pushes every new one to
//! the subscribed [`ProgressSink`]s.

use std::fmt;
use std::sync::Arc;

use crate::domain::BatchRun;
use crate::ports::{ProgressSink, RunSnapshot};
use crate::projection::Projection;

/// Latest snapshot plus the sinks that want to hear about changes.
pub struct ProgressStore {
    latest: Arc<RunSnapshot>,
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl ProgressStore {
    /// Creates an idle store.
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            latest: Arc::new(RunSnapshot::idle(now_ms)),
            sinks: Vec::new(),
        }
    }

    /// Registers a sink and immediately sends it the current snapshot.
    pub fn subscribe(&mut self, sink: Arc<dyn ProgressSink>) {
        sink.on_update(&self.latest);
        self.sinks.push(sink);
    }

    /// Number of registered sinks.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sinks.len()
    }

    /// The most recently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RunSnapshot> {
        Arc::clone(&self.latest)
    }

    /// Publishes a snapshot of `run` taken at `now_ms` to every sink.
    pub fn publish(&mut self, run: Option<&BatchRun>, now_ms: u64) -> Arc<RunSnapshot> {
        let snapshot = Arc::new(RunSnapshot {
            revision: self.latest.revision + 1,
            at_ms: now_ms,
            run: run.cloned().map(Arc::new),
            projection: Projection::compute(run, now_ms),
        });
        for sink in &self.sinks {
            sink.on_update(&snapshot);
        }
        self.latest = Arc::clone(&snapshot);
        snapshot
    }
}

impl fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressStore")
            .field("latest", &self.latest)
            .field("sinks", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::RunStatus;

    #[derive(Default)]
    struct Recorder {
        revisions: Mutex<Vec<u64>>,
    }

    impl ProgressSink for Recorder {
        fn on_update(&self, snapshot: &RunSnapshot) {
            if let Ok(mut revisions) = self.revisions.lock() {
                revisions.push(snapshot.revision);
            }
        }
    }

    fn revisions(recorder: &Recorder) -> Vec<u64> {
        recorder
            .revisions
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_subscribe_receives_current_snapshot() {
        let mut store = ProgressStore::new(0);
        let recorder = Arc::new(Recorder::default());
        store.subscribe(recorder.clone());
        assert_eq!(revisions(&recorder), vec![0]);
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_publish_notifies_every_sink() {
        let mut store = ProgressStore::new(0);
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        store.subscribe(a.clone());
        store.subscribe(b.clone());

        let run = BatchRun::new(1, 4, 0);
        store.publish(Some(&run), 10);
        store.publish(Some(&run), 20);

        assert_eq!(revisions(&a), vec![0, 1, 2]);
        assert_eq!(revisions(&b), vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshots_are_immutable_copies() {
        let mut store = ProgressStore::new(0);
        let mut run = BatchRun::new(1, 4, 0);
        let first = store.publish(Some(&run), 10);

        run.processed_items = 3;
        store.publish(Some(&run), 20);

        assert_eq!(first.projection.processed, 0);
        assert_eq!(first.projection.status, RunStatus::Starting);
        assert_eq!(store.snapshot().projection.processed, 3);
    }
}
