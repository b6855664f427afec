//! rpindex-server — HTTP API over the withdrawal-address index.
//!
//! # Architecture
//!
//! - **AppState**: the lookup service and the sync engine, shared by handlers
//! - **Routes**: `POST /` batch lookup, `GET /health` sync status
//! - **ApiError**: maps [`rpindex_core::IndexerError`] onto JSON error bodies

mod error;
mod routes;
mod state;

pub use self::error::ApiError;
pub use self::routes::router;
pub use self::state::AppState;
