//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for every cache tier.
///
/// Absence is never an error: misses surface as `None`/`false`. These
/// variants are reserved for real I/O and encoding failures.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backend unreachable or not connected yet
    #[error("{0}")]
    Connection(String),

    /// Command failed on the Redis backend
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Value could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Glob pattern passed to `keys` could not be compiled
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Connection(_) | CacheError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidPattern(_) => StatusCode::BAD_REQUEST,
            CacheError::Serialization(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache layer.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_displays_bare_message() {
        let err = CacheError::Connection("Connection failed".to_string());
        assert_eq!(err.to_string(), "Connection failed");
    }

    #[test]
    fn test_error_status_codes() {
        let response = CacheError::Connection("down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = CacheError::InvalidPattern("[".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = CacheError::Internal("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
