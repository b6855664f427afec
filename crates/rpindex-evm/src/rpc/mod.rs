//! JSON-RPC plumbing: wire types, the transport trait and the HTTP transport.

pub mod error;
pub mod http;
pub mod request;
pub mod transport;

pub use error::TransportError;
pub use http::{HttpClientConfig, HttpRpcClient};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use transport::{RpcCaller, RpcTransport};
