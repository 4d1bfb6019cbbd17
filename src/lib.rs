//! Tiered Cache - volatile and persistent TTL caches
//!
//! Provides a process-lifetime memo table with read-time TTLs and a durable
//! cache with write-time expiry, swept periodically in the background.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod persistent;
pub mod tasks;

pub use api::AppState;
pub use cache::VolatileCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use persistent::PersistentCache;
pub use tasks::spawn_cleanup_task;
