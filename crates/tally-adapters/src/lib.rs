//! Tally Adapters - External adapters for tally.
//!
//! This crate provides adapters for:
//! - JSON Lines event logs (files or stdin)
//! - The wall clock

pub mod clock;
pub mod jsonl;

pub use clock::{rfc3339, SystemClock};
pub use jsonl::{parse_line, JsonlEventSource, LogInput};
