//! Tally Core - progress aggregation for externally executed batch jobs.
//!
//! Turns an unordered, partially duplicated stream of worker progress events
//! into one consistent run state, and derives the projections (percent,
//! throughput, ETA, status) that display widgets render.
//!
//! Data flows one way: [`InboundEvent`] → [`EventIngestor`] →
//! [`LifecycleController`] (+ [`Deduplicator`]) → [`BatchRun`] →
//! [`Projection`] → [`ProgressSink`]s.

pub mod domain;
pub mod ingest;
pub mod ports;
pub mod projection;
pub mod store;
pub mod tracker;

pub use domain::{BatchRun, IdentitySource, ItemKey, ItemReport, ItemResult, RunPhase, RunStatus};
pub use ingest::{EventIngestor, InboundEvent, IngestOutcome, IngestStats, WorkerMessage};
pub use ports::{Clock, EventSource, ProgressSink, ResultOutput, RunSnapshot};
pub use projection::{DisplayModel, Projection};
pub use store::ProgressStore;
pub use tracker::{
    Deduplicator, LifecycleController, RecordOutcome, StallWatchdog, StartOutcome,
    DEFAULT_STALL_TIMEOUT,
};
