//! Builders for inbound worker events.

use tally_core::ingest::{InboundEvent, WorkerMessage};

/// Shorthand constructors for inbound events.
pub struct EventBuilder;

impl EventBuilder {
    /// A `start` event.
    #[must_use]
    pub fn start(total_files: u64) -> InboundEvent {
        WorkerMessage::Start { total_files }.into()
    }

    /// A `progress` event.
    #[must_use]
    pub fn progress(current: u64, total: u64) -> InboundEvent {
        WorkerMessage::Progress { current, total }.into()
    }

    /// A `complete` event.
    #[must_use]
    pub fn complete() -> InboundEvent {
        WorkerMessage::Complete.into()
    }

    /// Starts an `item` event for the given filename.
    #[must_use]
    pub fn item(file_name: &str) -> ItemEventBuilder {
        ItemEventBuilder {
            file_name: file_name.to_string(),
            image_path: None,
            image_id: None,
            processing_time_ms: None,
            total: None,
            generation: None,
            at: None,
        }
    }

    /// An `item` event identified only by an explicit id.
    #[must_use]
    pub fn item_with_id(id: &str) -> InboundEvent {
        Self::item(&format!("{id}.jpg")).id(id).build()
    }

    /// `count` item events with distinct ids `img-0`, `img-1`, ...
    #[must_use]
    pub fn distinct_items(count: usize) -> Vec<InboundEvent> {
        (0..count)
            .map(|i| Self::item_with_id(&format!("img-{i}")))
            .collect()
    }
}

/// Builder for `item` events.
#[derive(Debug, Clone)]
#[must_use]
pub struct ItemEventBuilder {
    file_name: String,
    image_path: Option<String>,
    image_id: Option<String>,
    processing_time_ms: Option<u64>,
    total: Option<u64>,
    generation: Option<u64>,
    at: Option<u64>,
}

impl ItemEventBuilder {
    /// Sets the explicit id.
    pub fn id(mut self, id: &str) -> Self {
        self.image_id = Some(id.to_string());
        self
    }

    /// Sets the stable path.
    pub fn path(mut self, path: &str) -> Self {
        self.image_path = Some(path.to_string());
        self
    }

    /// Sets the reported processing time.
    pub const fn duration(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    /// Sets the total hint.
    pub const fn total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Stamps the event with a generation.
    pub const fn generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Sets the emission time.
    pub const fn at(mut self, at_ms: u64) -> Self {
        self.at = Some(at_ms);
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> InboundEvent {
        InboundEvent {
            generation: self.generation,
            at: self.at,
            message: WorkerMessage::Item {
                file_name: self.file_name,
                image_path: self.image_path,
                image_id: self.image_id,
                processing_time_ms: self.processing_time_ms,
                total: self.total,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_builder() {
        let event = EventBuilder::item("a.jpg")
            .id("id-1")
            .duration(30)
            .total(4)
            .generation(2)
            .at(100)
            .build();

        assert_eq!(event.generation, Some(2));
        assert_eq!(event.at, Some(100));
        let report = event.message.item_report();
        assert!(report.is_some_and(|r| r.key.id == "id-1" && r.total_hint == Some(4)));
    }

    #[test]
    fn test_distinct_items() {
        let items = EventBuilder::distinct_items(3);
        assert_eq!(items.len(), 3);
        assert_ne!(items[0], items[1]);
    }
}
