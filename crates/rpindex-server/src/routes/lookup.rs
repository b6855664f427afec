//! Batch lookup endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

use rpindex_core::LookupResult;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /` with a JSON array of addresses.
///
/// The body is parsed by hand so that every malformed shape (not JSON, not an
/// array, non-string items) yields the same 400 instead of axum's rejections.
pub async fn lookup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<LookupResult>>, ApiError> {
    let addresses: Vec<String> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let results = state.lookup.lookup(&addresses).await?;
    Ok(Json(results))
}
