//! SQLite Engine
//!
//! File-backed durable engine built on rusqlite. Blocking calls run on the
//! tokio blocking pool; one connection is shared behind a mutex, which also
//! serializes transactions.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{CacheError, Result};
use crate::persistent::{
    DurableEngine, EngineProvider, PersistentCacheEntry, CACHE_TABLE, EXPIRY_INDEX,
};

// == SQLite Engine ==
pub struct SqliteEngine {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteEngine {
    /// Opens (or creates) the database at `path` and ensures the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::EngineOpen(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| CacheError::EngineOpen(format!("{}: {}", path.display(), e)))?;
        Self::from_connection(conn)
    }

    /// Opens a private database that disappears with the engine.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::EngineOpen(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn).map_err(|e| CacheError::EngineOpen(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let outcome = tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .map_err(|e| CacheError::Transaction(e.to_string()))?;

        Ok(outcome?)
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {CACHE_TABLE} (
            key TEXT PRIMARY KEY NOT NULL,
            data TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS {EXPIRY_INDEX} ON {CACHE_TABLE}(expires_at);"
    ))
}

// SQLite integers are signed; instants past i64::MAX clamp
fn to_sql_ms(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

fn from_sql_ms(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

#[async_trait]
impl DurableEngine for SqliteEngine {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, key: &str) -> Result<Option<PersistentCacheEntry>> {
        let key = key.to_string();
        let row = self
            .with_conn(move |conn| {
                conn.query_row(
                    &format!(
                        "SELECT key, data, timestamp, expires_at FROM {CACHE_TABLE} WHERE key = ?1"
                    ),
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )
                .optional()
            })
            .await?;

        let Some((key, data, timestamp, expires_at)) = row else {
            return Ok(None);
        };

        Ok(Some(PersistentCacheEntry {
            key,
            data: serde_json::from_str(&data)?,
            timestamp: from_sql_ms(timestamp),
            expires_at: from_sql_ms(expires_at),
        }))
    }

    async fn put(&self, entry: PersistentCacheEntry) -> Result<()> {
        let data = serde_json::to_string(&entry.data)?;
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {CACHE_TABLE} (key, data, timestamp, expires_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                        data = excluded.data,
                        timestamp = excluded.timestamp,
                        expires_at = excluded.expires_at"
                ),
                params![
                    entry.key,
                    data,
                    to_sql_ms(entry.timestamp),
                    to_sql_ms(entry.expires_at)
                ],
            )
        })
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute(&format!("DELETE FROM {CACHE_TABLE} WHERE key = ?1"), params![key])
        })
        .await?;
        Ok(())
    }

    async fn delete_if_expired(&self, key: &str, now: u64) -> Result<bool> {
        let key = key.to_string();
        let now = to_sql_ms(now);
        let removed = self
            .with_conn(move |conn| {
                conn.execute(
                    &format!("DELETE FROM {CACHE_TABLE} WHERE key = ?1 AND expires_at < ?2"),
                    params![key, now],
                )
            })
            .await?;
        Ok(removed > 0)
    }

    async fn clear(&self) -> Result<()> {
        self.with_conn(|conn| conn.execute(&format!("DELETE FROM {CACHE_TABLE}"), []))
            .await?;
        Ok(())
    }

    async fn delete_expired(&self, now: u64) -> Result<usize> {
        let now = to_sql_ms(now);
        let removed = self
            .with_conn(move |conn| {
                conn.execute(
                    &format!("DELETE FROM {CACHE_TABLE} WHERE expires_at <= ?1"),
                    params![now],
                )
            })
            .await?;
        debug!(removed, "swept expired sqlite rows");
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        let count = self
            .with_conn(|conn| {
                conn.query_row(&format!("SELECT COUNT(*) FROM {CACHE_TABLE}"), [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

// == SQLite Provider ==
/// Opens a [`SqliteEngine`] at a path, or in memory when no path is set.
#[derive(Debug, Clone, Default)]
pub struct SqliteProvider {
    path: Option<PathBuf>,
}

impl SqliteProvider {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn in_memory() -> Self {
        Self { path: None }
    }
}

#[async_trait]
impl EngineProvider for SqliteProvider {
    async fn open(&self) -> Result<Arc<dyn DurableEngine>> {
        let path = self.path.clone();
        let engine = tokio::task::spawn_blocking(move || match path {
            Some(path) => SqliteEngine::open(&path),
            None => SqliteEngine::open_in_memory(),
        })
        .await
        .map_err(|e| CacheError::EngineOpen(e.to_string()))??;

        match &self.path {
            Some(path) => info!("Opened sqlite cache at {}", path.display()),
            None => info!("Opened in-memory sqlite cache"),
        }
        Ok(Arc::new(engine))
    }
}
