//! Cache Entry Module
//!
//! Defines a single volatile entry: a type-erased payload and its write time.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::duration_ms;

// == Cache Entry ==
/// Represents a single volatile cache entry.
///
/// No TTL is stored; freshness is decided at read time.
#[derive(Clone)]
pub struct CacheEntry {
    /// Key the entry is stored under
    pub key: String,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Opaque payload
    data: Arc<dyn Any + Send + Sync>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped at `now`.
    pub fn new<T>(key: impl Into<String>, data: T, now: u64) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            key: key.into(),
            timestamp: now,
            data: Arc::new(data),
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was written.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }

    // == Is Fresh ==
    /// Checks the entry against a caller-supplied TTL.
    ///
    /// The boundary is inclusive: an entry exactly `ttl` old is still fresh.
    pub fn is_fresh(&self, now: u64, ttl: Duration) -> bool {
        self.age_ms(now) <= duration_ms(ttl)
    }

    // == Payload ==
    /// Returns a clone of the payload if it was stored as a `T`.
    pub fn data<T>(&self) -> Option<T>
    where
        T: Any + Clone,
    {
        self.data.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}
