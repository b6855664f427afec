//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    /// Last block folded into the index.
    cursor: u64,
    syncing: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let cursor = state.engine.cursor().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        cursor,
        syncing: state.engine.is_running(),
    }))
}
