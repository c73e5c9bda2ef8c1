//! Time source port.

/// Supplies the current time to the ingestor.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}
