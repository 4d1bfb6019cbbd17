//! Volatile Cache Module
//!
//! Process-lifetime memoization keyed by strings, with the freshness window
//! chosen by each reader rather than stored with the entry.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::VolatileCache;

// == Public Constants ==
/// Read-time TTL used when a caller does not supply one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Prefix shared by every key scoped to a learning unit.
pub const UNIT_KEY_PREFIX: &str = "unit_";

// == Key Helpers ==
/// Builds the prefix matched by [`VolatileCache::invalidate_unit`].
pub fn unit_prefix(unit_id: u64) -> String {
    format!("{UNIT_KEY_PREFIX}{unit_id}")
}

/// Builds a unit-scoped key such as `unit_7_progress`.
pub fn unit_key(unit_id: u64, name: &str) -> String {
    format!("{}_{}", unit_prefix(unit_id), name)
}
