//! Shared types for the sync and lookup paths.

use serde::{Deserialize, Serialize};

use crate::address::{serialize_checksum, Address};

// ─── WithdrawalAddressSet ────────────────────────────────────────────────────

/// A decoded `NodeWithdrawalAddressSet(node, withdrawalAddress, time)` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalAddressSet {
    /// The node operator whose withdrawal address changed.
    pub node: Address,
    /// The node's new withdrawal address.
    pub withdrawal_address: Address,
    pub block_number: u64,
    /// Log index within the block.
    pub log_index: u64,
}

impl WithdrawalAddressSet {
    /// Position of the log in ledger order.
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

// ─── IndexEntry ──────────────────────────────────────────────────────────────

/// One row of the derived index: the withdrawal address override for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub node: Address,
    pub withdrawal_address: Address,
    /// Block of the event that last set this entry.
    pub block_number: u64,
}

impl From<&WithdrawalAddressSet> for IndexEntry {
    fn from(event: &WithdrawalAddressSet) -> Self {
        Self {
            node: event.node,
            withdrawal_address: event.withdrawal_address,
            block_number: event.block_number,
        }
    }
}

// ─── LookupResult ────────────────────────────────────────────────────────────

/// One item of a lookup response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupResult {
    /// The queried address, echoed exactly as the caller sent it.
    pub withdrawal_credential: String,
    /// Resolved withdrawal address, or the zero address for non-minipools.
    #[serde(serialize_with = "serialize_checksum")]
    pub rp_withdrawal_address: Address,
}

impl LookupResult {
    pub fn not_a_pool(input: impl Into<String>) -> Self {
        Self {
            withdrawal_credential: input.into(),
            rp_withdrawal_address: Address::ZERO,
        }
    }
}
