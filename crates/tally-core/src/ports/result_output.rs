//! Result output port for the result-table renderer.

use crate::domain::ItemResult;

/// Port receiving each accepted item exactly once.
pub trait ResultOutput: Send + Sync {
    /// Writes a single accepted item.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, result: &ItemResult) -> anyhow::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> anyhow::Result<()>;
}
