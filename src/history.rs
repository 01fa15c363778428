//! Recent-lookup history.
//!
//! An insertion-ordered, deduplicated, size-bounded store of successful
//! lookups. The store rides inside the settings object and is persisted
//! with it, so the last few citations survive restarts.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the history
pub const HISTORY_CAPACITY: usize = 50;

/// A single remembered lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentLookup {
    /// The identifier that was looked up (unique within the store)
    pub identifier: String,

    /// The inline mark the lookup produced
    pub inline_mark: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Bounded, deduplicated store of recent successful lookups
///
/// Entries are kept oldest-first internally; [`RecentLookups::list`]
/// reverses for display. Re-recording an identifier moves it to the
/// most-recent slot. The capacity bound holds after every `record`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentLookups {
    entries: Vec<RecentLookup>,
}

impl RecentLookups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful lookup.
    ///
    /// Removes any existing entry with the same identifier, appends a fresh
    /// entry stamped now, then evicts from the front (oldest) while over
    /// capacity.
    pub fn record(&mut self, identifier: &str, inline_mark: &str) {
        self.entries.retain(|e| e.identifier != identifier);
        self.entries.push(RecentLookup {
            identifier: identifier.to_string(),
            inline_mark: inline_mark.to_string(),
            timestamp: Utc::now().timestamp_millis(),
        });
        if self.entries.len() > HISTORY_CAPACITY {
            let excess = self.entries.len() - HISTORY_CAPACITY;
            self.entries.drain(..excess);
        }
    }

    /// Entries ordered most-recent-first for display
    pub fn list(&self) -> Vec<&RecentLookup> {
        self.entries.iter().rev().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_list_order() {
        let mut history = RecentLookups::new();
        history.record("111111", "[^A-1]");
        history.record("222222", "[^B-2]");
        history.record("333333", "[^C-3]");

        let listed = history.list();
        assert_eq!(listed.len(), 3);
        // Most recent first
        assert_eq!(listed[0].identifier, "333333");
        assert_eq!(listed[2].identifier, "111111");
    }

    #[test]
    fn test_dedup_moves_to_most_recent() {
        let mut history = RecentLookups::new();
        history.record("111111", "[^A-1]");
        history.record("222222", "[^B-2]");
        history.record("111111", "[^A-1-again]");

        assert_eq!(history.len(), 2);
        let listed = history.list();
        assert_eq!(listed[0].identifier, "111111");
        assert_eq!(listed[0].inline_mark, "[^A-1-again]");
        assert_eq!(listed[1].identifier, "222222");
    }

    #[test]
    fn test_capacity_bound_evicts_oldest() {
        let mut history = RecentLookups::new();
        for i in 0..60 {
            history.record(&format!("id-{}", i), "[^x]");
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        let listed = history.list();
        // Newest kept, oldest ten evicted
        assert_eq!(listed[0].identifier, "id-59");
        assert_eq!(listed.last().unwrap().identifier, "id-10");
    }

    #[test]
    fn test_identifiers_stay_unique_under_churn() {
        let mut history = RecentLookups::new();
        for i in 0..200 {
            history.record(&format!("id-{}", i % 30), "[^x]");
        }

        assert_eq!(history.len(), 30);
        let listed = history.list();
        let mut seen: Vec<&str> = listed.iter().map(|e| e.identifier.as_str()).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 30);
    }

    #[test]
    fn test_clear() {
        let mut history = RecentLookups::new();
        history.record("111111", "[^A-1]");
        history.clear();
        assert!(history.is_empty());
    }
}
