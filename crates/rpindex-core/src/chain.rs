//! The ledger as seen by the sync engine and the lookup service.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::address::Address;
use crate::error::IndexerError;
use crate::types::WithdrawalAddressSet;

/// Typed access to the ledger.
///
/// Every interaction with the chain goes through this trait, so tests can swap
/// in a scripted implementation.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Highest block number the node reports as finalized.
    async fn finalized_height(&self) -> Result<u64, IndexerError>;

    /// `NodeWithdrawalAddressSet` events in `(from_exclusive, to_inclusive]`.
    async fn withdrawal_address_events(
        &self,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<WithdrawalAddressSet>, IndexerError>;

    /// Whether `address` is a registered minipool.
    async fn is_pool(&self, address: &Address) -> Result<bool, IndexerError>;

    /// The node operator that owns minipool `pool`.
    async fn pool_owner(&self, pool: &Address) -> Result<Address, IndexerError>;

    /// Stream of new head block numbers.
    async fn new_heads(&self) -> Result<mpsc::Receiver<u64>, IndexerError>;
}
