//! Volatile Store Module
//!
//! In-memory key table with lazy, read-time TTL eviction and prefix-scoped
//! bulk invalidation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::cache::{unit_prefix, CacheEntry, CacheStats, DEFAULT_TTL};
use crate::clock::Clock;

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

// == Volatile Cache ==
/// Process-lifetime cache shared by every caller through an `Arc`.
///
/// Entries carry only their write time. Each `get`/`has` supplies its own
/// TTL, so one entry can be fresh for one caller and stale for another.
pub struct VolatileCache {
    table: Mutex<Table>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl VolatileCache {
    // == Constructor ==
    /// Creates an empty cache using [`DEFAULT_TTL`] for reads without a TTL.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_default_ttl(clock, DEFAULT_TTL)
    }

    /// Creates an empty cache with a custom default read TTL.
    pub fn with_default_ttl(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            clock,
            default_ttl,
        }
    }

    /// The TTL applied by [`get`](Self::get) and [`has`](Self::has).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // A panic while holding the lock cannot leave the map half-updated
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Get ==
    /// Reads `key` with the default TTL.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        self.get_with_ttl(key, self.default_ttl)
    }

    /// Reads `key` if it was written no more than `ttl` ago.
    ///
    /// A stale entry is removed before returning `None`, so a later read
    /// with a longer TTL misses as well. A fresh entry holding some other
    /// type is a miss but stays in place.
    pub fn get_with_ttl<T>(&self, key: &str, ttl: Duration) -> Option<T>
    where
        T: Any + Clone,
    {
        let now = self.clock.now_ms();
        let mut table = self.lock();

        match table.entries.get(key).map(|entry| entry.is_fresh(now, ttl)) {
            None => {
                table.stats.record_miss();
                return None;
            }
            Some(false) => {
                table.entries.remove(key);
                let remaining = table.entries.len();
                table.stats.record_expired();
                table.stats.record_miss();
                table.stats.set_total_entries(remaining);
                debug!(key, ttl_ms = ttl.as_millis() as u64, "evicted stale entry");
                return None;
            }
            Some(true) => {}
        }

        let value = table.entries.get(key).and_then(CacheEntry::data::<T>);
        match value {
            Some(_) => table.stats.record_hit(),
            None => table.stats.record_miss(),
        }
        value
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any previous entry.
    pub fn set<T>(&self, key: impl Into<String>, data: T)
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        let entry = CacheEntry::new(key.clone(), data, self.clock.now_ms());

        let mut table = self.lock();
        table.entries.insert(key, entry);
        let count = table.entries.len();
        table.stats.set_total_entries(count);
    }

    // == Has ==
    /// Checks freshness under the default TTL without evicting.
    pub fn has(&self, key: &str) -> bool {
        self.has_with_ttl(key, self.default_ttl)
    }

    /// Checks freshness under `ttl` without evicting.
    pub fn has_with_ttl(&self, key: &str, ttl: Duration) -> bool {
        let now = self.clock.now_ms();
        self.lock()
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh(now, ttl))
    }

    // == Invalidate ==
    /// Removes a single entry. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut table = self.lock();
        let removed = table.entries.remove(key).is_some();
        if removed {
            let count = table.entries.len();
            table.stats.record_invalidated(1);
            table.stats.set_total_entries(count);
        }
        removed
    }

    // == Invalidate Unit ==
    /// Removes every entry whose key starts with `unit_<unit_id>`.
    ///
    /// Matching is a plain string prefix: keys that do not follow the
    /// `unit_<id>_...` convention are never touched, and `unit_1` also
    /// matches keys of unit 10, 11, and so on.
    pub fn invalidate_unit(&self, unit_id: u64) -> usize {
        let prefix = unit_prefix(unit_id);
        let mut table = self.lock();

        let before = table.entries.len();
        table.entries.retain(|key, _| !key.starts_with(&prefix));
        let removed = before - table.entries.len();

        let count = table.entries.len();
        table.stats.record_invalidated(removed);
        table.stats.set_total_entries(count);
        debug!(unit_id, removed, "invalidated unit entries");
        removed
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&self) {
        let mut table = self.lock();
        let removed = table.entries.len();
        table.entries.clear();
        table.stats.record_invalidated(removed);
        table.stats.set_total_entries(0);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let table = self.lock();
        let mut stats = table.stats.clone();
        stats.set_total_entries(table.entries.len());
        stats
    }

    /// Returns the number of entries, fresh or not.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}
