//! Expiry Sweep Task
//!
//! Background task that periodically deletes expired persistent entries,
//! so rows nobody reads again do not pile up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::persistent::PersistentCache;

/// Spawns a background task that calls [`PersistentCache::cleanup`] every
/// `interval`.
///
/// Sweep failures are logged and the loop carries on. The returned handle is
/// aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(PersistentCache::new(provider, Arc::new(SystemClock)));
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(300));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<PersistentCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.cleanup().await {
                Ok(0) => debug!("Expiry sweep: no expired entries found"),
                Ok(removed) => info!("Expiry sweep: removed {} expired entries", removed),
                Err(e) => warn!("Expiry sweep failed: {}", e),
            }
        }
    })
}
