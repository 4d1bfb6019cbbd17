//! API Handlers
//!
//! HTTP request handlers exposing both cache tiers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::cache::VolatileCache;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, MemoQuery, MemoRequest,
    RemovedResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::persistent::PersistentCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-lifetime memo table
    pub volatile: Arc<VolatileCache>,
    /// Durable cache
    pub persistent: Arc<PersistentCache>,
    /// TTL for persistent writes that do not name one
    pub default_ttl: Duration,
}

impl AppState {
    pub fn new(
        volatile: Arc<VolatileCache>,
        persistent: Arc<PersistentCache>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            volatile,
            persistent,
            default_ttl,
        }
    }

    /// Builds both tiers on the system clock from configuration.
    pub fn from_config(config: &Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let volatile = VolatileCache::with_default_ttl(clock.clone(), config.volatile_ttl());
        let persistent = PersistentCache::new(config.engine_provider(), clock);
        Self::new(
            Arc::new(volatile),
            Arc::new(persistent),
            config.persistent_ttl(),
        )
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(msg) => Err(CacheError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req
        .ttl_ms
        .map(Duration::from_millis)
        .unwrap_or(state.default_ttl);
    state.persistent.set(&req.key, &req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key, Some(ttl.as_millis() as u64))))
}

/// Handler for GET /cache/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;

    match state.persistent.get::<Value>(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;

    state.persistent.delete(&key).await?;
    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /admin/cache/clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<StatusCode> {
    state.persistent.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /admin/cache/cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Result<Json<RemovedResponse>> {
    let removed = state.persistent.cleanup().await?;
    Ok(Json(RemovedResponse { removed }))
}

/// Handler for PUT /memo
pub async fn memo_set_handler(
    State(state): State<AppState>,
    Json(req): Json<MemoRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.volatile.set(req.key.clone(), req.value);
    Ok(Json(SetResponse::new(req.key, None)))
}

/// Handler for GET /memo/:key
pub async fn memo_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<MemoQuery>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;

    let ttl = query
        .ttl_ms
        .map(Duration::from_millis)
        .unwrap_or(state.volatile.default_ttl());
    match state.volatile.get_with_ttl::<Value>(&key, ttl) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /memo/:key
pub async fn memo_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;

    if state.volatile.invalidate(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /memo/unit/:unit_id
pub async fn memo_unit_handler(
    State(state): State<AppState>,
    Path(unit_id): Path<u64>,
) -> Json<RemovedResponse> {
    let removed = state.volatile.invalidate_unit(unit_id);
    Json(RemovedResponse { removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let persistent_entries = state.persistent.len().await;
    Json(StatsResponse::new(state.volatile.stats(), persistent_entries))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.persistent.is_available().await))
}
