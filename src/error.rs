//! Error types for the API cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Fetch Error Enum ==
/// Errors raised by an upstream [`Fetcher`](crate::fetch::Fetcher).
///
/// `Clone` so that one in-flight result can be handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS or protocol failure talking to the upstream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered but the body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request could not be built (bad method, header, ...)
    #[error("Invalid fetch request: {0}")]
    InvalidRequest(String),

    /// The task driving a shared fetch panicked or was cancelled
    #[error("Fetch aborted: {0}")]
    Aborted(String),
}

// == Cache Error Enum ==
/// Unified error type for the cache engine and its admin API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// URL pattern could not be compiled
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence substrate failed to read or write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Upstream fetch failed
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Persistence(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch(_) => StatusCode::BAD_GATEWAY,
            CacheError::Persistence(_) | CacheError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
