//! Run lifecycle: deduplication, aggregate state updates, and stall detection.

mod dedup;
mod lifecycle;
mod watchdog;

pub use dedup::Deduplicator;
pub use lifecycle::{LifecycleController, RecordOutcome, StartOutcome};
pub use watchdog::{StallWatchdog, DEFAULT_STALL_TIMEOUT};
