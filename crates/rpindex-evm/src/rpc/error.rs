//! Transport-level error types.

use thiserror::Error;

use rpindex_core::IndexerError;

use crate::rpc::request::JsonRpcError;

/// Errors raised while talking JSON-RPC to a node.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failure or non-2xx status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Error object returned by the node (e.g. an execution revert).
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The response did not have the expected shape.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and the request may be re-sent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }
}

impl From<TransportError> for IndexerError {
    fn from(e: TransportError) -> Self {
        IndexerError::ChainCall(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_failures_retry() {
        assert!(TransportError::Http("refused".into()).is_retryable());
        assert!(TransportError::Timeout { ms: 30_000 }.is_retryable());
        assert!(!TransportError::Rpc(JsonRpcError {
            code: 3,
            message: "execution reverted".into(),
            data: None,
        })
        .is_retryable());
        assert!(!TransportError::Other("x".into()).is_retryable());
    }

    #[test]
    fn converts_to_chain_call() {
        let e: IndexerError = TransportError::Timeout { ms: 5 }.into();
        assert!(matches!(e, IndexerError::ChainCall(ref m) if m.contains("5ms")));
    }
}
