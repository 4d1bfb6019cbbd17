//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::persistent::{EngineProvider, MemoryProvider, SqliteProvider, UnsupportedProvider};

// == Storage Backend ==
/// Which durable engine sits under the persistent cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite file at `db_path`
    Sqlite,
    /// Process-lifetime engine, lost on restart
    Memory,
    /// No durable engine; the persistent cache is a no-op
    Disabled,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            "disabled" | "none" => Ok(Self::Disabled),
            other => Err(format!("unknown cache backend: {other}")),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Default read TTL of the volatile cache in milliseconds
    pub volatile_ttl_ms: u64,
    /// Persistent TTL in seconds for writes that do not name one
    pub default_ttl: u64,
    /// Expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Durable engine selection
    pub backend: StorageBackend,
    /// SQLite database file
    pub db_path: PathBuf,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `VOLATILE_TTL_MS` - Volatile read TTL in ms (default: 300000)
    /// - `DEFAULT_TTL` - Persistent TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `CACHE_BACKEND` - `sqlite`, `memory` or `disabled` (default: sqlite)
    /// - `CACHE_DB_PATH` - SQLite file (default: tiered_cache.db)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            volatile_ttl_ms: env_or("VOLATILE_TTL_MS", defaults.volatile_ttl_ms),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            backend: env_or("CACHE_BACKEND", defaults.backend),
            db_path: env::var("CACHE_DB_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
        }
    }

    pub fn volatile_ttl(&self) -> Duration {
        Duration::from_millis(self.volatile_ttl_ms)
    }

    pub fn persistent_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    // A zero interval would spin the sweep loop
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }

    /// Builds the engine provider for the configured backend.
    pub fn engine_provider(&self) -> Arc<dyn EngineProvider> {
        match self.backend {
            StorageBackend::Sqlite => Arc::new(SqliteProvider::file(self.db_path.clone())),
            StorageBackend::Memory => Arc::new(MemoryProvider::new()),
            StorageBackend::Disabled => Arc::new(UnsupportedProvider),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            volatile_ttl_ms: 300_000,
            default_ttl: 300,
            cleanup_interval: 300,
            backend: StorageBackend::Sqlite,
            db_path: PathBuf::from("tiered_cache.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.volatile_ttl(), crate::cache::DEFAULT_TTL);
        assert_eq!(config.persistent_ttl(), Duration::from_secs(300));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.backend, StorageBackend::Sqlite);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "VOLATILE_TTL_MS",
            "DEFAULT_TTL",
            "CLEANUP_INTERVAL",
            "CACHE_BACKEND",
            "CACHE_DB_PATH",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.volatile_ttl_ms, 300_000);
        assert_eq!(config.cleanup_interval, 300);
        assert_eq!(config.db_path, PathBuf::from("tiered_cache.db"));
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("SQLite".parse::<StorageBackend>(), Ok(StorageBackend::Sqlite));
        assert_eq!(" memory ".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert_eq!("none".parse::<StorageBackend>(), Ok(StorageBackend::Disabled));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let config = Config {
            cleanup_interval: 0,
            ..Config::default()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_disabled_backend_is_unsupported() {
        let config = Config {
            backend: StorageBackend::Disabled,
            ..Config::default()
        };
        assert!(!config.engine_provider().is_supported());
    }
}
