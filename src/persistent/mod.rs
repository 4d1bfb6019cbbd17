//! Persistent Cache Module
//!
//! Durable cache with expiry fixed at write time, backed by any engine that
//! implements [`DurableEngine`].

mod engine;
mod entry;
mod memory;
mod sqlite;
mod store;

// Re-export public types
pub use engine::{DurableEngine, EngineProvider, UnsupportedProvider};
pub use entry::PersistentCacheEntry;
pub use memory::{MemoryEngine, MemoryProvider};
pub use sqlite::{SqliteEngine, SqliteProvider};
pub use store::PersistentCache;

// == Public Constants ==
/// Name of the table holding cache rows.
pub const CACHE_TABLE: &str = "cache_entries";

/// Name of the secondary index used for expiry sweeps.
pub const EXPIRY_INDEX: &str = "idx_cache_entries_expires_at";
