//! Inbound boundary messages and the ingestor that applies them.

mod ingestor;
mod message;

pub use ingestor::{EventIngestor, IngestOutcome, IngestStats};
pub use message::{InboundEvent, WorkerMessage};
