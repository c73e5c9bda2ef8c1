//! Event source port for reading worker boundary messages.

use crate::ingest::InboundEvent;

/// Port for reading inbound events from the worker boundary.
pub trait EventSource: Send + Sync {
    /// Returns an iterator over events in arrival order.
    ///
    /// # Errors
    ///
    /// Individual items may be errors if a message cannot be read or parsed.
    /// Consumers skip those and keep going.
    fn events(&self) -> Box<dyn Iterator<Item = anyhow::Result<InboundEvent>> + Send + '_>;

    /// Returns the number of messages available, if known.
    fn count_hint(&self) -> Option<usize>;
}
