//! API Routes
//!
//! Configures the Axum router with all cache endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_handler, delete_handler, get_handler, health_handler,
    memo_delete_handler, memo_get_handler, memo_set_handler, memo_unit_handler, set_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Store a JSON value in the persistent tier
/// - `GET /cache/:key` - Read a persistent value
/// - `DELETE /cache/:key` - Delete a persistent value
/// - `POST /admin/cache/clear` - Drop every persistent value
/// - `POST /admin/cache/cleanup` - Sweep expired persistent values now
/// - `PUT /memo` - Store a JSON value in the volatile tier
/// - `GET /memo/:key?ttl_ms=` - Read a volatile value with a read-time TTL
/// - `DELETE /memo/:key` - Invalidate a volatile value
/// - `DELETE /memo/unit/:unit_id` - Invalidate every `unit_<id>` value
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache", put(set_handler))
        .route("/cache/:key", get(get_handler).delete(delete_handler))
        .route("/admin/cache/clear", post(clear_handler))
        .route("/admin/cache/cleanup", post(cleanup_handler))
        .route("/memo", put(memo_set_handler))
        .route("/memo/unit/:unit_id", delete(memo_unit_handler))
        .route("/memo/:key", get(memo_get_handler).delete(memo_delete_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
