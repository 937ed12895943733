//! Time-windowed dedup cache for analyzed process identities.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Remembers which identities were analyzed and when.
///
/// Purging is time-based only; there is no process-exit notification.
#[derive(Debug, Default)]
pub struct DedupCache {
    seen: HashMap<String, Instant>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as seen at `now`. Returns false if it was already present.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, now: Instant) -> bool {
        match self.seen.entry(key.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(now);
                true
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains_key(key)
    }

    /// Drop entries older than `max_age`. Returns how many were removed.
    pub fn purge_older_than(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.seen.len();
        self.seen
            .retain(|_, first_seen| now.saturating_duration_since(*first_seen) <= max_age);
        before - self.seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }
}
