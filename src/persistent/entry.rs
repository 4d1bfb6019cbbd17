//! Persistent Entry Module
//!
//! A durable cache row: JSON payload plus write and expiry instants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::duration_ms;

// == Persistent Cache Entry ==
/// Row stored by a durable engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentCacheEntry {
    /// Primary key
    pub key: String,
    /// JSON payload
    pub data: Value,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Absolute expiry (Unix milliseconds)
    pub expires_at: u64,
}

impl PersistentCacheEntry {
    // == Constructor ==
    /// Creates a row written at `now` that lives for `ttl`.
    pub fn new(key: impl Into<String>, data: Value, now: u64, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            data,
            timestamp: now,
            expires_at: now.saturating_add(duration_ms(ttl)),
        }
    }

    // == Is Expired ==
    /// A row is readable up to and including its expiry instant.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.expires_at
    }

    // == Is Sweepable ==
    /// The background sweep reclaims rows whose expiry is at or before `now`.
    pub fn is_sweepable(&self, now: u64) -> bool {
        self.expires_at <= now
    }
}
