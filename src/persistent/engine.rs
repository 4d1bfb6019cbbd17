//! Durable Engine Capability
//!
//! The contract a storage backend must meet to sit under the persistent
//! cache, and the provider that opens it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{CacheError, Result};
use crate::persistent::PersistentCacheEntry;

// == Durable Engine ==
/// Transactional key-value store with an index on `expires_at`.
///
/// Each call is its own transaction; calls awaited in sequence are applied
/// in order.
#[async_trait]
pub trait DurableEngine: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    // == Get ==
    /// Returns the row for `key`, expired or not.
    async fn get(&self, key: &str) -> Result<Option<PersistentCacheEntry>>;

    // == Put ==
    /// Inserts or replaces the row for `entry.key`.
    async fn put(&self, entry: PersistentCacheEntry) -> Result<()>;

    // == Delete ==
    /// Removes `key`; absent keys are not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    // == Delete If Expired ==
    /// Removes `key` only if its row is still past expiry at `now`
    /// (`now > expires_at`), checked in the same transaction as the delete.
    ///
    /// Returns whether a row was removed. A row rewritten since the caller
    /// read it is left alone.
    async fn delete_if_expired(&self, key: &str, now: u64) -> Result<bool>;

    // == Clear ==
    /// Removes every row.
    async fn clear(&self) -> Result<()>;

    // == Delete Expired ==
    /// Deletes every row with `expires_at <= now` and returns how many.
    async fn delete_expired(&self, now: u64) -> Result<usize>;

    // == Count ==
    /// Number of stored rows, expired or not.
    async fn count(&self) -> Result<usize>;
}

// == Engine Provider ==
/// Opens a durable engine, creating its schema on first use.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    /// Whether this runtime can host the engine at all.
    fn is_supported(&self) -> bool {
        true
    }

    async fn open(&self) -> Result<Arc<dyn DurableEngine>>;
}

// == Unsupported Provider ==
/// Provider for runtimes with no durable engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProvider;

#[async_trait]
impl EngineProvider for UnsupportedProvider {
    fn is_supported(&self) -> bool {
        false
    }

    async fn open(&self) -> Result<Arc<dyn DurableEngine>> {
        Err(CacheError::EngineUnavailable)
    }
}
