//! At-most-once acceptance of item ids within a run.

use std::collections::HashSet;

/// Tracks which item ids the current run has already accepted.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    /// Creates an empty deduplicator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` has not been seen before in this run.
    ///
    /// Empty ids cannot be deduplicated and are always accepted.
    pub fn accept(&mut self, id: &str) -> bool {
        if id.is_empty() {
            return true;
        }
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_owned())
    }

    /// Forgets every id. Called when a new run begins.
    pub fn clear(&mut self) {
        self.seen.clear();
    }

    /// Number of distinct ids accepted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing has been accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_once() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept("a.jpg"));
        assert!(!dedup.accept("a.jpg"));
        assert!(dedup.accept("b.jpg"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_empty_id_always_accepted() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(""));
        assert!(dedup.accept(""));
        assert!(dedup.is_empty());
    }

    #[test]
    fn test_clear_resets_membership() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept("a"));
        dedup.clear();
        assert!(dedup.accept("a"));
    }
}
