//! Cache Statistics Module
//!
//! Tracks volatile cache hits, misses, and removals.

use serde::Serialize;

// == Cache Stats ==
/// Tracks volatile cache metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of fresh reads
    pub hits: u64,
    /// Number of reads that found nothing usable
    pub misses: u64,
    /// Number of entries lazily evicted as stale
    pub expired: u64,
    /// Number of entries removed by explicit invalidation
    pub invalidated: u64,
    /// Current number of entries in the table
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if nothing has been read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Counts a fresh read.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Counts a read that returned nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Expired ==
    /// Counts one stale entry removed on read.
    pub fn record_expired(&mut self) {
        self.expired += 1;
    }

    // == Record Invalidated ==
    /// Adds `count` explicitly removed entries.
    pub fn record_invalidated(&mut self, count: usize) {
        self.invalidated += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
