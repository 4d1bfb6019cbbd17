//! In-Memory Engine
//!
//! Durable-engine implementation that lives for the process. Rows are kept
//! in a map with a sorted `(expires_at, key)` index for range sweeps.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::persistent::{DurableEngine, EngineProvider, PersistentCacheEntry};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, PersistentCacheEntry>,
    by_expiry: BTreeSet<(u64, String)>,
}

impl Tables {
    fn remove(&mut self, key: &str) -> Option<PersistentCacheEntry> {
        let row = self.rows.remove(key)?;
        self.by_expiry.remove(&(row.expires_at, row.key.clone()));
        Some(row)
    }
}

// == Memory Engine ==
#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: RwLock<Tables>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<PersistentCacheEntry>> {
        Ok(self.tables.read().await.rows.get(key).cloned())
    }

    async fn put(&self, entry: PersistentCacheEntry) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.remove(&entry.key);
        tables.by_expiry.insert((entry.expires_at, entry.key.clone()));
        tables.rows.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.tables.write().await.remove(key);
        Ok(())
    }

    async fn delete_if_expired(&self, key: &str, now: u64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.rows.get(key).is_some_and(|row| row.is_expired(now)) {
            return Ok(false);
        }
        Ok(tables.remove(key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.rows.clear();
        tables.by_expiry.clear();
        Ok(())
    }

    async fn delete_expired(&self, now: u64) -> Result<usize> {
        let mut tables = self.tables.write().await;

        // Everything sorted before (now + 1, "") has expires_at <= now
        let keep = match now.checked_add(1) {
            Some(bound) => tables.by_expiry.split_off(&(bound, String::new())),
            None => BTreeSet::new(),
        };
        let expired = std::mem::replace(&mut tables.by_expiry, keep);

        for (_, key) in &expired {
            tables.rows.remove(key);
        }
        Ok(expired.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.tables.read().await.rows.len())
    }
}

// == Memory Provider ==
/// Hands out one shared [`MemoryEngine`], so reopening keeps the rows.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    engine: Arc<MemoryEngine>,
    opens: AtomicUsize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct handle on the engine, bypassing any cache on top of it.
    pub fn engine(&self) -> Arc<MemoryEngine> {
        Arc::clone(&self.engine)
    }

    /// How many times [`EngineProvider::open`] has run.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineProvider for MemoryProvider {
    async fn open(&self) -> Result<Arc<dyn DurableEngine>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.engine.clone())
    }
}
