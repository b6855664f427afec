//! Wiring shared by the subcommands.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};

use rpindex_core::{RetryConfig, SyncConfig, SyncConfigBuilder};
use rpindex_evm::{EvmChainClient, HttpClientConfig, HttpRpcClient, RpcCaller};
use rpindex_storage::SqliteStorage;

use crate::GlobalArgs;

impl GlobalArgs {
    pub fn sync_config(&self) -> Result<SyncConfig> {
        let retry = RetryConfig {
            max_retries: self.sync_retries,
            ..RetryConfig::default()
        };
        SyncConfigBuilder::new()
            .genesis_block(self.genesis_block)
            .max_query_range(self.max_query_range)
            .retry(retry)
            .build()
            .context("invalid sync configuration")
    }

    pub async fn open_store(&self) -> Result<Arc<SqliteStorage>> {
        let store = SqliteStorage::open_dir(&self.db_dir)
            .await
            .with_context(|| format!("opening database in {}", self.db_dir.display()))?;
        Ok(Arc::new(store))
    }

    /// Connect to the node and resolve the Rocket Pool contracts.
    pub async fn connect_chain(&self) -> Result<EvmChainClient> {
        let transport = HttpRpcClient::new(
            self.rpc.clone(),
            HttpClientConfig {
                request_timeout: Duration::from_secs(self.rpc_timeout_secs),
                ..HttpClientConfig::default()
            },
        )?;
        tracing::info!(rpc = %self.rpc, "connecting to node");
        let client = EvmChainClient::connect(RpcCaller::new(Arc::new(transport)), self.rocket_storage)
            .await
            .context("resolving Rocket Pool contracts")?;
        Ok(client)
    }
}
