//! Lookup service: resolves the withdrawal address behind each credential.
//!
//! For each queried address:
//! 1. ask the minipool manager whether it is a minipool
//! 2. if not, answer with the zero address
//! 3. if so, resolve the minipool's node, then prefer the node's indexed
//!    withdrawal address over the node address itself
//!
//! The batch is validated up front; items then run concurrently and the
//! results come back in request order. One failed item fails the batch.

use std::sync::Arc;

use futures::future::try_join_all;

use crate::address::Address;
use crate::chain::ChainClient;
use crate::checkpoint::CheckpointStore;
use crate::error::IndexerError;
use crate::types::LookupResult;

/// Parse every entry of a lookup request, rejecting the batch on the first
/// malformed one.
pub fn parse_batch(raw: &[String]) -> Result<Vec<Address>, IndexerError> {
    raw.iter()
        .enumerate()
        .map(|(i, s)| {
            Address::parse(s).map_err(|_| {
                IndexerError::Validation(format!(
                    "expected array of addresses: entry {i} ({s:?}) is not a 0x-prefixed 20-byte hex address"
                ))
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct LookupService {
    client: Arc<dyn ChainClient>,
    store: Arc<dyn CheckpointStore>,
}

impl LookupService {
    pub fn new(client: Arc<dyn ChainClient>, store: Arc<dyn CheckpointStore>) -> Self {
        Self { client, store }
    }

    /// Resolve a batch of addresses, one result per input, in input order.
    pub async fn lookup(&self, raw: &[String]) -> Result<Vec<LookupResult>, IndexerError> {
        let addresses = parse_batch(raw)?;
        let results = try_join_all(
            raw.iter()
                .zip(addresses)
                .map(|(input, address)| self.resolve(input, address)),
        )
        .await?;
        tracing::debug!(count = results.len(), "lookup batch resolved");
        Ok(results)
    }

    async fn resolve(&self, input: &str, address: Address) -> Result<LookupResult, IndexerError> {
        if !self.client.is_pool(&address).await? {
            return Ok(LookupResult::not_a_pool(input));
        }
        let node = self.client.pool_owner(&address).await?;
        let resolved = self
            .store
            .withdrawal_address_for(&node)
            .await?
            .unwrap_or(node);
        Ok(LookupResult {
            withdrawal_credential: input.to_string(),
            rp_withdrawal_address: resolved,
        })
    }
}
