//! Error types shared by the sync engine, the checkpoint store and the lookup path.

use thiserror::Error;

/// Errors that can occur while syncing or serving lookups.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Malformed lookup input. Raised before any chain call is made.
    #[error("validation error: {0}")]
    Validation(String),

    /// JSON-RPC / network failure talking to the ledger.
    #[error("chain call error: {0}")]
    ChainCall(String),

    /// Checkpoint store read or write failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IndexerError {
    /// Returns `true` if the caller sent bad input (maps to a 4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if re-running the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ChainCall(_) | Self::Persistence(_))
    }
}
