//! Item identity and accepted item results.

use serde::{Deserialize, Serialize};

/// Where an item's identity was taken from.
///
/// Ordered from strongest to weakest. Two distinct items can share a
/// filename in different folders, so [`IdentitySource::FileName`] is only a
/// compatibility fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    /// Explicit unique id supplied by the worker.
    ExplicitId,
    /// Stable path of the input item.
    Path,
    /// Bare filename.
    FileName,
    /// No usable identifier was present.
    None,
}

/// Resolved identity of an inbound item event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemKey {
    /// The identifier used for deduplication. Empty when nothing was supplied.
    pub id: String,
    /// Which candidate field produced `id`.
    pub source: IdentitySource,
}

impl ItemKey {
    /// Resolves an identity from the candidate identifiers on an item event.
    ///
    /// Precedence is explicit id, then path, then filename. Blank candidates
    /// are skipped.
    #[must_use]
    pub fn resolve(image_id: Option<&str>, image_path: Option<&str>, file_name: &str) -> Self {
        fn non_blank(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(id) = non_blank(image_id) {
            return Self::new(id, IdentitySource::ExplicitId);
        }
        if let Some(path) = non_blank(image_path) {
            return Self::new(path, IdentitySource::Path);
        }
        match non_blank(Some(file_name)) {
            Some(name) => Self::new(name, IdentitySource::FileName),
            None => Self::new("", IdentitySource::None),
        }
    }

    /// Creates a key from an explicit id.
    #[must_use]
    pub fn explicit(id: impl Into<String>) -> Self {
        Self::new(id, IdentitySource::ExplicitId)
    }

    fn new(id: impl Into<String>, source: IdentitySource) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    /// Returns true if this key cannot be deduplicated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

/// A single item event as seen by the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    /// Resolved identity.
    pub key: ItemKey,
    /// Processing time reported by the worker.
    pub duration_ms: Option<u64>,
    /// Total item count carried on the event, if any.
    pub total_hint: Option<u64>,
}

impl ItemReport {
    /// Creates a report with no duration and no total hint.
    #[must_use]
    pub const fn new(key: ItemKey) -> Self {
        Self {
            key,
            duration_ms: None,
            total_hint: None,
        }
    }

    /// Sets the reported processing time.
    #[must_use]
    pub const fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the total hint.
    #[must_use]
    pub const fn with_total_hint(mut self, total: u64) -> Self {
        self.total_hint = Some(total);
        self
    }
}

/// The accepted outcome of processing one input item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    /// Deduplication id.
    pub id: String,
    /// Which identifier the id came from.
    pub identity: IdentitySource,
    /// Acceptance time in milliseconds since the Unix epoch.
    pub received_at_ms: u64,
    /// Reported processing time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Generation of the run that accepted this item.
    pub generation: u64,
}
