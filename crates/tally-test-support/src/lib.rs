//! Test support utilities for tally.
//!
//! Provides a manual clock, mock ports, and inbound event builders for
//! testing the aggregation pipeline.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tally_core::EventIngestor;
//! use tally_test_support::{EventBuilder, ManualClock, MockProgressSink};
//!
//! let clock = ManualClock::shared(0);
//! let sink = Arc::new(MockProgressSink::new());
//! let mut ingestor = EventIngestor::new(clock.clone());
//! ingestor.subscribe(sink.clone());
//!
//! ingestor.ingest(EventBuilder::start(2));
//! ingestor.ingest(EventBuilder::item_with_id("a"));
//!
//! assert_eq!(sink.counter_text().as_deref(), Some("1/2"));
//! ```

mod builders;
mod mocks;

pub use builders::{EventBuilder, ItemEventBuilder};
pub use mocks::{ManualClock, MockEventSource, MockProgressSink, MockResultOutput};
