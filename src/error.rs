//! Error types for the cache tiers
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for both cache tiers and the HTTP surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No durable engine exists in this runtime
    #[error("Durable engine unavailable")]
    EngineUnavailable,

    /// The durable engine could not be opened or its schema created
    #[error("Engine open failed: {0}")]
    EngineOpen(String),

    /// A single engine operation failed
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Payload could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found or no longer fresh
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for CacheError {
    fn from(err: rusqlite::Error) -> Self {
        CacheError::Transaction(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            CacheError::EngineUnavailable | CacheError::EngineOpen(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::Transaction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache tiers.
pub type Result<T> = std::result::Result<T, CacheError>;
