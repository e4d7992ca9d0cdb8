//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, writes, deletions and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a value
    pub hits: u64,
    /// Number of lookups that found nothing
    pub misses: u64,
    /// Number of values stored
    pub sets: u64,
    /// Number of explicit deletions that removed something
    pub deletes: u64,
    /// Number of keys removed by their TTL timer
    pub expirations: u64,
    /// Current number of indexed key paths (prefixes included)
    pub total_keys: usize,
    /// Current number of armed TTL timers
    pub pending_expirations: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Counts a lookup that found its key.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Counts a lookup that found nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Set ==
    /// Counts a stored value.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    // == Record Delete ==
    /// Counts a delete that removed at least one path.
    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    // == Record Expiration ==
    /// Counts a key removed by its TTL timer.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}
