//! API Module
//!
//! HTTP handlers and routing over the volatile and persistent caches.
//!
//! # Endpoints
//! - `/cache/...` - Persistent tier
//! - `/memo/...` - Volatile tier
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
