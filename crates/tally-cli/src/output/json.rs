//! JSON output adapter.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use serde::Serialize;
use tally_adapters::rfc3339;
use tally_core::{IdentitySource, ItemResult, ResultOutput};

/// An accepted item as written to stdout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultRecord<'a> {
    id: &'a str,
    identity: IdentitySource,
    received_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u64>,
    generation: u64,
}

impl<'a> From<&'a ItemResult> for ResultRecord<'a> {
    fn from(result: &'a ItemResult) -> Self {
        Self {
            id: &result.id,
            identity: result.identity,
            received_at: rfc3339(result.received_at_ms),
            duration_ms: result.duration_ms,
            generation: result.generation,
        }
    }
}

/// JSON output adapter.
///
/// In lines mode every accepted item is written as it arrives. In array mode
/// items are buffered and written as one JSON array on [`ResultOutput::flush`].
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    buffered: Option<Mutex<Vec<ItemResult>>>,
    pretty: bool,
}

impl JsonOutput {
    /// Creates a JSON Lines output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Creates a JSON Lines output writing to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            buffered: None,
            pretty: false,
        }
    }

    /// Switches to array mode.
    #[must_use]
    pub fn array(mut self, pretty: bool) -> Self {
        self.buffered = Some(Mutex::new(Vec::new()));
        self.pretty = pretty;
        self
    }

    /// Writes any serializable value as one JSON document.
    #[allow(clippy::significant_drop_tightening)]
    pub fn write_value<T: Serialize>(&self, value: &T) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    /// Writes a batch of results as a JSON array.
    pub fn write_array(&self, results: &[ItemResult]) -> Result<()> {
        let records: Vec<ResultRecord<'_>> = results.iter().map(ResultRecord::from).collect();
        self.write_value(&records)
    }
}

impl ResultOutput for JsonOutput {
    #[allow(clippy::significant_drop_tightening)]
    fn write(&self, result: &ItemResult) -> Result<()> {
        if let Some(buffered) = &self.buffered {
            buffered
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(result.clone());
            return Ok(());
        }

        let json = serde_json::to_string(&ResultRecord::from(result))?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writeln!(writer, "{json}")?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        if let Some(buffered) = &self.buffered {
            let results = std::mem::take(
                &mut *buffered.lock().unwrap_or_else(PoisonError::into_inner),
            );
            self.write_array(&results)?;
        }

        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        writer.flush()?;
        Ok(())
    }
}
