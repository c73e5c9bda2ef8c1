//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the aggregation core and
//! external adapters: the worker pool feeding events in, the result table
//! and display widgets reading results out, and the clock.

mod clock;
mod event_source;
mod progress;
mod result_output;

pub use clock::Clock;
pub use event_source::EventSource;
pub use progress::{ProgressSink, RunSnapshot};
pub use result_output::ResultOutput;
