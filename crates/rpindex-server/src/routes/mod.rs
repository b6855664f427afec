//! API route definitions.

mod health;
mod lookup;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the API router.
///
/// - `POST /` - batch withdrawal-address lookup
/// - `GET /health` - sync cursor and whether a run is in flight
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(lookup::lookup))
        .route("/health", get(health::health_check))
        .with_state(state)
}
