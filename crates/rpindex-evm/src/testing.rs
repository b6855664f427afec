//! Scripted transport for unit tests.

use std::sync::{Arc, Mutex};

use alloy_core::dyn_abi::DynSolValue;
use async_trait::async_trait;
use serde_json::Value;

use crate::abi;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse, RpcTransport, TransportError};

type Handler = Box<dyn Fn(&JsonRpcRequest) -> Result<Value, TransportError> + Send + Sync>;

pub(crate) struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<JsonRpcRequest>>,
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&JsonRpcRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<JsonRpcRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        self.requests.lock().unwrap().push(req.clone());
        (self.handler)(&req).map(|v| JsonRpcResponse::success(req.id, v))
    }

    fn url(&self) -> &str {
        "mock://node"
    }
}

/// `(to, data)` of an `eth_call` request.
pub(crate) fn call_target(req: &JsonRpcRequest) -> (String, String) {
    let call = &req.params[0];
    (
        call["to"].as_str().unwrap_or_default().to_string(),
        call["data"].as_str().unwrap_or_default().to_string(),
    )
}

/// Whether `data` calls `signature`.
pub(crate) fn calls(data: &str, signature: &str) -> bool {
    data.starts_with(&format!("0x{}", hex::encode(abi::selector(signature))))
}

/// An ABI return word holding `address`.
pub(crate) fn address_word(address: &rpindex_core::Address) -> Value {
    Value::String(format!("0x{}", hex::encode(abi::address_arg(address).abi_encode())))
}

pub(crate) fn bool_word(b: bool) -> Value {
    let word = DynSolValue::Bool(b).abi_encode();
    Value::String(format!("0x{}", hex::encode(word)))
}
