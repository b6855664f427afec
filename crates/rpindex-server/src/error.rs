//! API error types and response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use rpindex_core::IndexerError;

/// Message returned for every malformed lookup request.
pub const BAD_REQUEST_MESSAGE: &str = "expected array of addresses";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not a JSON array of well-formed addresses.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The ledger could not be read.
    #[error("chain error: {0}")]
    Chain(String),

    /// The checkpoint store could not be read.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<IndexerError> for ApiError {
    fn from(e: IndexerError) -> Self {
        match e {
            IndexerError::Validation(msg) => Self::BadRequest(msg),
            IndexerError::ChainCall(msg) => Self::Chain(msg),
            IndexerError::Persistence(msg) => Self::Storage(msg),
            IndexerError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::BadRequest(detail) => {
                tracing::debug!(%detail, "rejected lookup request");
                (StatusCode::BAD_REQUEST, "bad_request", BAD_REQUEST_MESSAGE.to_string())
            }
            Self::Chain(msg) => {
                tracing::error!(error = %msg, "chain error");
                (StatusCode::INTERNAL_SERVER_ERROR, "chain_error", msg)
            }
            Self::Storage(msg) => {
                tracing::error!(error = %msg, "storage error");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}
