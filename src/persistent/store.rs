//! Persistent Store Module
//!
//! Lazily opens a durable engine once and degrades to a no-op cache when the
//! engine is missing or fails. Reads never fail; writes report engine faults
//! so callers can treat them as "not cached".

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::{CacheError, Result};
use crate::persistent::{DurableEngine, EngineProvider, PersistentCacheEntry};

/// Outcome of the one and only open attempt.
enum EngineSlot {
    Ready(Arc<dyn DurableEngine>),
    Unavailable,
    Failed(String),
}

// == Persistent Cache ==
pub struct PersistentCache {
    provider: Arc<dyn EngineProvider>,
    clock: Arc<dyn Clock>,
    supported: bool,
    slot: OnceCell<EngineSlot>,
}

impl PersistentCache {
    // == Constructor ==
    /// Creates a cache over `provider`. Nothing is opened until first use.
    pub fn new(provider: Arc<dyn EngineProvider>, clock: Arc<dyn Clock>) -> Self {
        let supported = provider.is_supported();
        if !supported {
            info!("Durable engine not supported, persistent cache disabled");
        }

        Self {
            provider,
            clock,
            supported,
            slot: OnceCell::new(),
        }
    }

    /// Whether the runtime offers a durable engine at all.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether the engine is open and serving requests.
    pub async fn is_available(&self) -> bool {
        self.engine().await.is_some()
    }

    async fn open_slot(&self) -> EngineSlot {
        if !self.supported {
            return EngineSlot::Unavailable;
        }

        match self.provider.open().await {
            Ok(engine) => {
                info!("Persistent cache ready on {} engine", engine.name());
                EngineSlot::Ready(engine)
            }
            Err(CacheError::EngineUnavailable) => EngineSlot::Unavailable,
            Err(e) => {
                error!("Failed to open persistent cache: {}", e);
                EngineSlot::Failed(e.to_string())
            }
        }
    }

    async fn engine(&self) -> Option<&Arc<dyn DurableEngine>> {
        match self.slot.get_or_init(|| self.open_slot()).await {
            EngineSlot::Ready(engine) => Some(engine),
            EngineSlot::Unavailable | EngineSlot::Failed(_) => None,
        }
    }

    // == Init ==
    /// Opens the engine if nobody has yet.
    ///
    /// Concurrent callers share one open attempt. An open failure is
    /// reported here, and only here, on every call.
    pub async fn init(&self) -> Result<()> {
        match self.slot.get_or_init(|| self.open_slot()).await {
            EngineSlot::Ready(_) | EngineSlot::Unavailable => Ok(()),
            EngineSlot::Failed(reason) => Err(CacheError::EngineOpen(reason.clone())),
        }
    }

    // == Get ==
    /// Returns the stored value if present and not past its expiry.
    ///
    /// Expired rows are deleted before returning `None`, unless a newer write
    /// has already replaced them. Engine faults and
    /// payloads that do not decode as `T` are also `None`.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let engine = self.engine().await?;

        let entry = match engine.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, "Persistent cache read failed: {}", e);
                return None;
            }
        };

        let now = self.clock.now_ms();
        if entry.is_expired(now) {
            // A concurrent set may have replaced the row since it was read
            match engine.delete_if_expired(key, now).await {
                Ok(removed) => debug!(key, removed, "Persistent entry expired"),
                Err(e) => warn!(key, "Failed to evict expired entry: {}", e),
            }
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, "Cached payload did not decode: {}", e);
                None
            }
        }
    }

    // == Set ==
    /// Stores `data` under `key` until `now + ttl`, replacing any prior row.
    pub async fn set<T>(&self, key: &str, data: &T, ttl: Duration) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let Some(engine) = self.engine().await else {
            return Ok(());
        };

        let data = serde_json::to_value(data)?;
        let entry = PersistentCacheEntry::new(key, data, self.clock.now_ms(), ttl);
        engine.put(entry).await
    }

    // == Delete ==
    /// Removes `key` whether or not it has expired.
    pub async fn delete(&self, key: &str) -> Result<()> {
        match self.engine().await {
            Some(engine) => engine.delete(key).await,
            None => Ok(()),
        }
    }

    // == Clear ==
    /// Drops every row, fresh or expired.
    pub async fn clear(&self) -> Result<()> {
        match self.engine().await {
            Some(engine) => {
                engine.clear().await?;
                info!("Persistent cache cleared");
                Ok(())
            }
            None => Ok(()),
        }
    }

    // == Cleanup ==
    /// Deletes every row whose expiry is at or before now.
    ///
    /// Returns the number of rows removed.
    pub async fn cleanup(&self) -> Result<usize> {
        match self.engine().await {
            Some(engine) => engine.delete_expired(self.clock.now_ms()).await,
            None => Ok(0),
        }
    }

    // == Length ==
    /// Number of stored rows, or `None` when no engine is open.
    pub async fn len(&self) -> Option<usize> {
        let engine = self.engine().await?;
        match engine.count().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Failed to count persistent entries: {}", e);
                None
            }
        }
    }
}
