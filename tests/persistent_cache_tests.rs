//! Integration Tests for the Persistent Cache
//!
//! Exercises the cache over a file-backed SQLite engine and checks the
//! engine directly where a filtered read would hide the difference.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tempfile::TempDir;
use tiered_cache::error::{CacheError, Result};
use tiered_cache::persistent::{
    DurableEngine, EngineProvider, PersistentCache, SqliteProvider, UnsupportedProvider,
};
use tiered_cache::{spawn_cleanup_task, ManualClock};
use tokio_test::{assert_err, assert_ok};

// == Helpers ==

/// Wraps a SQLite provider and counts how often open runs.
struct CountingProvider {
    inner: SqliteProvider,
    opens: AtomicUsize,
}

impl CountingProvider {
    fn new(inner: SqliteProvider) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EngineProvider for CountingProvider {
    async fn open(&self) -> Result<Arc<dyn DurableEngine>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        // Widen the race window for concurrent init callers
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.inner.open().await
    }
}

struct Fixture {
    dir: TempDir,
    clock: Arc<ManualClock>,
    provider: Arc<CountingProvider>,
    cache: Arc<PersistentCache>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let provider = Arc::new(CountingProvider::new(SqliteProvider::file(
        dir.path().join("cache.db"),
    )));
    let cache = Arc::new(PersistentCache::new(provider.clone(), clock.clone()));
    Fixture {
        dir,
        clock,
        provider,
        cache,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Deck {
    id: u32,
    title: String,
    cards: Vec<(String, String)>,
}

// == Round Trip ==

#[tokio::test]
async fn test_roundtrip_typed_payload() {
    let fx = fixture();
    let deck = Deck {
        id: 12,
        title: "Irregular verbs".to_string(),
        cards: vec![("ir".to_string(), "to go".to_string())],
    };

    assert_ok!(fx.cache.set("deck_12", &deck, Duration::from_secs(60)).await);
    assert_eq!(fx.cache.get::<Deck>("deck_12").await, Some(deck));
}

#[tokio::test]
async fn test_roundtrip_json_values() {
    let fx = fixture();
    let values = [
        json!(null),
        json!(true),
        json!(-3.5),
        json!("notebook"),
        json!([1, "two", {"three": 3}]),
        json!({"nested": {"list": [], "empty": {}}}),
    ];

    for (i, value) in values.iter().enumerate() {
        let key = format!("value_{i}");
        fx.cache.set(&key, value, Duration::from_secs(1)).await.unwrap();
        assert_eq!(fx.cache.get::<Value>(&key).await.as_ref(), Some(value));
    }
}

#[tokio::test]
async fn test_set_overwrites_and_restamps() {
    let fx = fixture();

    fx.cache.set("k", &1, Duration::from_millis(100)).await.unwrap();
    fx.clock.advance(Duration::from_millis(90));
    fx.cache.set("k", &2, Duration::from_millis(100)).await.unwrap();
    fx.clock.advance(Duration::from_millis(90));

    assert_eq!(fx.cache.get::<i32>("k").await, Some(2));
    assert_eq!(fx.cache.len().await, Some(1));
}

// == Expiry ==

#[tokio::test]
async fn test_expired_read_deletes_from_store() {
    let fx = fixture();

    fx.cache.set("quiz_1", &"answers", Duration::from_millis(10)).await.unwrap();
    fx.clock.advance(Duration::from_millis(11));

    assert_eq!(fx.cache.get::<String>("quiz_1").await, None);

    // Reopen the same file and look at the raw row
    let engine = fx.provider.inner.open().await.unwrap();
    assert!(engine.get("quiz_1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cleanup_removes_exactly_expired() {
    let fx = fixture();
    let expired = 5;
    let fresh = 4;

    for i in 0..expired {
        fx.cache.set(&format!("old_{i}"), &i, Duration::ZERO).await.unwrap();
    }
    for i in 0..fresh {
        fx.cache
            .set(&format!("new_{i}"), &i, Duration::from_secs(3600))
            .await
            .unwrap();
    }

    assert_eq!(fx.cache.cleanup().await.unwrap(), expired);
    assert_eq!(fx.cache.len().await, Some(fresh));
    for i in 0..fresh {
        assert_eq!(fx.cache.get::<usize>(&format!("new_{i}")).await, Some(i));
    }
    assert_eq!(fx.cache.cleanup().await.unwrap(), 0);
}

#[tokio::test]
async fn test_background_sweep_reclaims_unread_rows() {
    let fx = fixture();

    fx.cache.set("stale", &0, Duration::from_millis(1)).await.unwrap();
    fx.cache.set("live", &0, Duration::from_secs(60)).await.unwrap();
    fx.clock.advance(Duration::from_millis(2));

    let handle = spawn_cleanup_task(fx.cache.clone(), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(150)).await;
    handle.abort();

    assert_eq!(fx.cache.len().await, Some(1));
}

#[tokio::test]
async fn test_rows_survive_new_cache_instance() {
    let fx = fixture();
    fx.cache.set("kept", &"yes", Duration::from_secs(60)).await.unwrap();

    let reopened = PersistentCache::new(
        Arc::new(SqliteProvider::file(fx.dir.path().join("cache.db"))),
        fx.clock.clone(),
    );
    assert_eq!(reopened.get::<String>("kept").await, Some("yes".to_string()));
}

// == Init ==

#[tokio::test]
async fn test_concurrent_init_opens_once() {
    let fx = fixture();

    let inits = (0..8).map(|_| {
        let cache = fx.cache.clone();
        tokio::spawn(async move { cache.init().await })
    });
    for handle in inits.collect::<Vec<_>>() {
        assert_ok!(handle.await.unwrap());
    }

    assert_ok!(fx.cache.init().await);
    assert!(fx.cache.is_available().await);
    assert_eq!(fx.provider.opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_open_failure_rejects_init_only() {
    let dir = tempfile::tempdir().unwrap();
    // The directory itself is not a database file
    let cache = PersistentCache::new(
        Arc::new(SqliteProvider::file(dir.path())),
        Arc::new(ManualClock::new(0)),
    );

    let err = assert_err!(cache.init().await);
    assert!(matches!(err, CacheError::EngineOpen(_)));

    assert_ok!(cache.set("k", &1, Duration::from_secs(1)).await);
    assert_eq!(cache.get::<i32>("k").await, None);
    assert_ok!(cache.delete("k").await);
    assert_ok!(cache.clear().await);
    assert_eq!(cache.cleanup().await.unwrap(), 0);
}

// == Degradation ==

#[tokio::test]
async fn test_unsupported_engine_never_fails() {
    let cache =
        PersistentCache::new(Arc::new(UnsupportedProvider), Arc::new(ManualClock::new(0)));

    assert!(!cache.is_supported());
    assert_ok!(cache.init().await);
    for i in 0..3 {
        let key = format!("k{i}");
        assert_ok!(cache.set(&key, &i, Duration::from_secs(60)).await);
        assert_eq!(cache.get::<i32>(&key).await, None);
        assert_ok!(cache.delete(&key).await);
    }
    assert_ok!(cache.clear().await);
    assert_ok!(cache.cleanup().await);
    assert!(!cache.is_available().await);
}
