//! The `RpcTransport` trait and the typed call layer on top of it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use rpindex_core::{Address, IndexerError};

use crate::rpc::error::TransportError;
use crate::rpc::request::{JsonRpcRequest, JsonRpcResponse};

/// Anything that can carry a JSON-RPC request to a node.
///
/// Object-safe; stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send one request and return the node's response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Endpoint identifier, for logs.
    fn url(&self) -> &str;
}

/// Typed JSON-RPC calls over a shared transport.
///
/// Cheap to clone; clones share the request-id counter.
#[derive(Clone)]
pub struct RpcCaller {
    transport: Arc<dyn RpcTransport>,
    next_id: Arc<AtomicU64>,
}

impl RpcCaller {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        self.transport.url()
    }

    /// Call `method` and deserialize its result.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, IndexerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let resp = self
            .transport
            .send(JsonRpcRequest::new(id, method, params))
            .await?;
        let result = resp.into_result().map_err(TransportError::Rpc)?;
        serde_json::from_value(result)
            .map_err(|e| IndexerError::from(TransportError::Deserialization(e)))
    }

    /// `eth_call` against `to` at the latest block; returns the raw return data.
    pub async fn eth_call(&self, to: &Address, data: String) -> Result<String, IndexerError> {
        self.request(
            "eth_call",
            vec![json!({"to": to.to_canonical(), "data": data}), json!("latest")],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    #[tokio::test]
    async fn request_ids_increase() {
        let mock = MockTransport::new(|_| Ok(json!("0x10")));
        let rpc = RpcCaller::new(mock.clone());

        let a: String = rpc.request("eth_blockNumber", vec![]).await.unwrap();
        let _: String = rpc.clone().request("eth_blockNumber", vec![]).await.unwrap();

        assert_eq!(a, "0x10");
        let ids: Vec<u64> = mock.requests().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn node_error_becomes_chain_call() {
        let mock = MockTransport::new(|_| {
            Err(TransportError::Rpc(crate::rpc::JsonRpcError {
                code: -32000,
                message: "header not found".into(),
                data: None,
            }))
        });
        let rpc = RpcCaller::new(mock);
        let err = rpc.request::<String>("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(matches!(err, IndexerError::ChainCall(ref m) if m.contains("header not found")));
    }

    #[tokio::test]
    async fn wrong_result_type_is_chain_call() {
        let rpc = RpcCaller::new(MockTransport::new(|_| Ok(json!(42))));
        let err = rpc.request::<String>("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(matches!(err, IndexerError::ChainCall(_)));
    }
}
