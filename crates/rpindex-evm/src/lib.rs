//! rpindex-evm — Ethereum JSON-RPC implementation of [`rpindex_core::ChainClient`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rpindex_evm::{EvmChainClient, HttpRpcClient, RpcCaller};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpRpcClient::default_for("http://localhost:8545")?;
//! let client = EvmChainClient::connect(RpcCaller::new(Arc::new(transport)), None).await?;
//! println!("minipool manager: {}", client.contracts().minipool_manager);
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod client;
pub mod contracts;
pub mod rpc;

#[cfg(test)]
mod testing;

pub use client::EvmChainClient;
pub use contracts::RocketContracts;
pub use rpc::{HttpClientConfig, HttpRpcClient, RpcCaller, RpcTransport, TransportError};
