//! Inbound messages from the worker boundary.

use serde::{Deserialize, Serialize};

use crate::domain::{ItemKey, ItemReport};

/// A message emitted by the worker pool.
///
/// Serialized as a JSON object tagged by `type`, with camelCase fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkerMessage {
    /// The batch was started.
    #[serde(rename_all = "camelCase")]
    Start {
        /// Expected number of items.
        total_files: u64,
    },
    /// One item was processed.
    #[serde(rename_all = "camelCase")]
    Item {
        /// Filename of the input item.
        #[serde(default)]
        file_name: String,
        /// Stable path of the input item.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_path: Option<String>,
        /// Explicit unique id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_id: Option<String>,
        /// Processing time reported by the worker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        processing_time_ms: Option<u64>,
        /// Total item count as known by the worker.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<u64>,
    },
    /// Periodic counter update.
    Progress {
        /// Worker's own processed count. Advisory only.
        current: u64,
        /// Total item count as known by the worker.
        total: u64,
    },
    /// The batch finished.
    Complete,
}

impl WorkerMessage {
    /// Short name of the message kind, as it appears in the `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Item { .. } => "item",
            Self::Progress { .. } => "progress",
            Self::Complete => "complete",
        }
    }

    /// Converts an `item` message into a report for the lifecycle controller.
    #[must_use]
    pub fn item_report(&self) -> Option<ItemReport> {
        let Self::Item {
            file_name,
            image_path,
            image_id,
            processing_time_ms,
            total,
        } = self
        else {
            return None;
        };
        Some(ItemReport {
            key: ItemKey::resolve(image_id.as_deref(), image_path.as_deref(), file_name),
            duration_ms: *processing_time_ms,
            total_hint: *total,
        })
    }
}

/// A worker message plus optional delivery metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Generation of the run active when the worker emitted the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
    /// Emission time in milliseconds since the Unix epoch. Used instead of
    /// the clock when present, so recorded logs replay with their timing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<u64>,
    /// The message itself.
    #[serde(flatten)]
    pub message: WorkerMessage,
}

impl InboundEvent {
    /// Wraps a message with no metadata.
    #[must_use]
    pub const fn new(message: WorkerMessage) -> Self {
        Self {
            generation: None,
            at: None,
            message,
        }
    }

    /// Stamps the event with a generation.
    #[must_use]
    pub const fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Sets the emission time.
    #[must_use]
    pub const fn at(mut self, at_ms: u64) -> Self {
        self.at = Some(at_ms);
        self
    }
}

impl From<WorkerMessage> for InboundEvent {
    fn from(message: WorkerMessage) -> Self {
        Self::new(message)
    }
}
