//! Mock implementations of core port traits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tally_core::domain::{ItemResult, RunStatus};
use tally_core::ingest::InboundEvent;
use tally_core::ports::{Clock, EventSource, ProgressSink, ResultOutput, RunSnapshot};

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `now_ms`.
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    /// Creates a shared clock reading `now_ms`.
    #[must_use]
    pub fn shared(now_ms: u64) -> Arc<Self> {
        Arc::new(Self::new(now_ms))
    }

    /// Sets the current time.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Moves the clock forward.
    pub fn advance(&self, by_ms: u64) {
        self.now_ms.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Mock implementation of `EventSource` for testing.
///
/// Yields pre-built events, optionally interleaved with read errors.
pub struct MockEventSource {
    events: Vec<Result<InboundEvent, String>>,
}

impl MockEventSource {
    /// Creates a source yielding the given events.
    #[must_use]
    pub fn new(events: Vec<InboundEvent>) -> Self {
        Self {
            events: events.into_iter().map(Ok).collect(),
        }
    }

    /// Appends a read error.
    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.events.push(Err(message.into()));
        self
    }
}

impl EventSource for MockEventSource {
    fn events(&self) -> Box<dyn Iterator<Item = anyhow::Result<InboundEvent>> + Send + '_> {
        Box::new(self.events.iter().map(|e| match e {
            Ok(event) => Ok(event.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.events.len())
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures results for later assertions.
pub struct MockResultOutput {
    results: Arc<Mutex<Vec<ItemResult>>>,
    flush_count: Arc<Mutex<usize>>,
    fail_writes: bool,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            results: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
            fail_writes: false,
        }
    }

    /// Creates an output whose writes always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }

    /// Returns all captured results.
    #[must_use]
    pub fn results(&self) -> Vec<ItemResult> {
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the ids of captured results, in write order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.results().into_iter().map(|r| r.id).collect()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, result: &ItemResult) -> anyhow::Result<()> {
        if self.fail_writes {
            anyhow::bail!("result table unavailable");
        }
        self.results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(result.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures snapshots for later assertions.
pub struct MockProgressSink {
    snapshots: Arc<Mutex<Vec<RunSnapshot>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured snapshots.
    #[must_use]
    pub fn snapshots(&self) -> Vec<RunSnapshot> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of snapshots received.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.snapshots().len()
    }

    /// Returns the most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<RunSnapshot> {
        self.snapshots().pop()
    }

    /// Returns the status label of every snapshot, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<RunStatus> {
        self.snapshots()
            .iter()
            .map(|s| s.projection.status)
            .collect()
    }

    /// Returns the counter text of the most recent snapshot.
    #[must_use]
    pub fn counter_text(&self) -> Option<String> {
        self.last().map(|s| s.projection.counter_text())
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_update(&self, snapshot: &RunSnapshot) {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::EventBuilder;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn test_mock_event_source_yields_errors() {
        let source = MockEventSource::new(vec![EventBuilder::start(3)]).with_error("bad line");
        assert_eq!(source.count_hint(), Some(2));

        let events: Vec<_> = source.events().collect();
        assert!(events[0].is_ok());
        assert!(events[1].is_err());
    }

    #[test]
    fn test_mock_result_output() {
        let output = MockResultOutput::new();
        let result = ItemResult {
            id: "a.jpg".into(),
            identity: tally_core::IdentitySource::FileName,
            received_at_ms: 0,
            duration_ms: Some(10),
            generation: 1,
        };

        output.write(&result).unwrap();
        output.flush().unwrap();

        assert_eq!(output.ids(), vec!["a.jpg".to_string()]);
        assert_eq!(output.flush_count(), 1);
        assert!(MockResultOutput::failing().write(&result).is_err());
    }

    #[test]
    fn test_mock_progress_sink() {
        let sink = MockProgressSink::new();
        sink.on_update(&RunSnapshot::idle(0));

        assert_eq!(sink.update_count(), 1);
        assert_eq!(sink.statuses(), vec![RunStatus::Idle]);
        assert_eq!(sink.counter_text(), Some("0/0".to_string()));
    }
}
