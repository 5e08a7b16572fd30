//! Deadline tracking for expiring keys.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Tracks an expiry deadline per key.
///
/// Keys without a deadline never expire. Setting a TTL replaces any previous
/// deadline, so repeated refreshes reset the horizon instead of extending it.
/// Uses the tokio clock so paused-time tests can advance it.
#[derive(Debug, Default, Clone)]
pub struct TtlTracker {
    deadlines: HashMap<String, Instant>,
}

impl TtlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire `key` after `ttl` from now.
    pub fn set(&mut self, key: &str, ttl: Duration) {
        self.deadlines.insert(key.to_string(), Instant::now() + ttl);
    }

    /// Drop the deadline of `key`, making it persistent.
    pub fn remove(&mut self, key: &str) {
        self.deadlines.remove(key);
    }

    /// Check if `key` has passed its deadline.
    pub fn is_expired(&self, key: &str) -> bool {
        self.deadlines
            .get(key)
            .is_some_and(|deadline| *deadline <= Instant::now())
    }

    /// Remaining lifetime of `key`, `None` when it has no deadline.
    pub fn remaining(&self, key: &str) -> Option<Duration> {
        self.deadlines
            .get(key)
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Remove every expired deadline and return the affected keys.
    pub fn drain_expired(&mut self) -> Vec<String> {
        let now = Instant::now();
        let expired: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.deadlines.remove(key);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
