//! `ChainClient` over Ethereum JSON-RPC.
//!
//! - finalized height: `eth_getBlockByNumber("finalized", false)`
//! - events: `eth_getLogs` on `RocketStorage`, filtered by topic0
//! - minipool reads: `eth_call` at `latest`
//! - new heads: `eth_blockNumber` polled on an interval

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use rpindex_core::{Address, ChainClient, IndexerError, WithdrawalAddressSet};

use crate::abi;
use crate::contracts::RocketContracts;
use crate::rpc::RpcCaller;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

const HEAD_CHANNEL_CAPACITY: usize = 16;

/// A raw log as returned by `eth_getLogs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(rename = "blockNumber")]
    pub block_number: String,
    #[serde(rename = "logIndex")]
    pub log_index: String,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RawLog {
    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }

    /// Decode as `NodeWithdrawalAddressSet(node indexed, withdrawalAddress indexed, time)`.
    pub fn to_withdrawal_address_set(&self) -> Result<WithdrawalAddressSet, IndexerError> {
        let [_, node, withdrawal, ..] = self.topics.as_slice() else {
            return Err(IndexerError::ChainCall(format!(
                "log at block {} has {} topics, expected 3",
                self.block_number,
                self.topics.len()
            )));
        };
        Ok(WithdrawalAddressSet {
            node: abi::topic_to_address(node)?,
            withdrawal_address: abi::topic_to_address(withdrawal)?,
            block_number: parse_hex_u64(&self.block_number)?,
            log_index: parse_hex_u64(&self.log_index)?,
        })
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_hex_u64(s: &str) -> Result<u64, IndexerError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| IndexerError::ChainCall(format!("bad hex quantity {s:?}: {e}")))
}

fn hex_quantity(n: u64) -> String {
    format!("{n:#x}")
}

/// Chain client for the Rocket Pool contracts.
pub struct EvmChainClient {
    rpc: RpcCaller,
    contracts: RocketContracts,
    withdrawal_topic: String,
    poll_interval: Duration,
}

impl EvmChainClient {
    pub fn new(rpc: RpcCaller, contracts: RocketContracts) -> Self {
        Self {
            rpc,
            contracts,
            withdrawal_topic: abi::event_topic(abi::NODE_WITHDRAWAL_ADDRESS_SET),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Resolve the contracts, then build the client.
    pub async fn connect(rpc: RpcCaller, rocket_storage: Option<Address>) -> Result<Self, IndexerError> {
        let contracts = RocketContracts::resolve(&rpc, rocket_storage).await?;
        Ok(Self::new(rpc, contracts))
    }

    /// How often `new_heads` polls `eth_blockNumber`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn contracts(&self) -> &RocketContracts {
        &self.contracts
    }

    /// Latest block number, finalized or not.
    pub async fn head_height(&self) -> Result<u64, IndexerError> {
        block_number(&self.rpc).await
    }
}

async fn block_number(rpc: &RpcCaller) -> Result<u64, IndexerError> {
    let hex: String = rpc.request("eth_blockNumber", vec![]).await?;
    parse_hex_u64(&hex)
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn finalized_height(&self) -> Result<u64, IndexerError> {
        let block: Option<Value> = self
            .rpc
            .request("eth_getBlockByNumber", vec![json!("finalized"), json!(false)])
            .await?;
        let number = block
            .as_ref()
            .and_then(|b| b["number"].as_str())
            .ok_or_else(|| IndexerError::ChainCall("node returned no finalized block".into()))?;
        parse_hex_u64(number)
    }

    async fn withdrawal_address_events(
        &self,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<WithdrawalAddressSet>, IndexerError> {
        if to_inclusive <= from_exclusive {
            return Ok(vec![]);
        }
        let filter = json!({
            "address": self.contracts.rocket_storage.to_canonical(),
            "topics": [self.withdrawal_topic],
            "fromBlock": hex_quantity(from_exclusive + 1),
            "toBlock": hex_quantity(to_inclusive),
        });
        let logs: Vec<RawLog> = self.rpc.request("eth_getLogs", vec![filter]).await?;

        let events = logs
            .iter()
            .filter(|log| !log.is_removed())
            .map(RawLog::to_withdrawal_address_set)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            from = from_exclusive,
            to = to_inclusive,
            count = events.len(),
            "fetched withdrawal address events"
        );
        Ok(events)
    }

    async fn is_pool(&self, address: &Address) -> Result<bool, IndexerError> {
        let data = abi::encode_call(abi::GET_MINIPOOL_EXISTS, &[abi::address_arg(address)]);
        let ret = self.rpc.eth_call(&self.contracts.minipool_manager, data).await?;
        Ok(abi::decode_bool(&ret)?)
    }

    async fn pool_owner(&self, pool: &Address) -> Result<Address, IndexerError> {
        let data = abi::encode_call(abi::GET_NODE_ADDRESS, &[]);
        let ret = self.rpc.eth_call(pool, data).await?;
        Ok(abi::decode_address(&ret)?)
    }

    async fn new_heads(&self) -> Result<mpsc::Receiver<u64>, IndexerError> {
        let (tx, rx) = mpsc::channel(HEAD_CHANNEL_CAPACITY);
        tokio::spawn(poll_heads(self.rpc.clone(), self.poll_interval, tx));
        Ok(rx)
    }
}

/// Emit strictly increasing head numbers until the receiver goes away.
async fn poll_heads(rpc: RpcCaller, period: Duration, tx: mpsc::Sender<u64>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last: Option<u64> = None;

    loop {
        ticker.tick().await;
        if tx.is_closed() {
            break;
        }
        match block_number(&rpc).await {
            Ok(head) if last.map_or(true, |l| head > l) => {
                last = Some(head);
                if tx.send(head).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "head poll failed"),
        }
    }
    tracing::debug!("head poller stopped");
}
