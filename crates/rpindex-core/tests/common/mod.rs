//! Scripted `ChainClient` and store wrappers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use rpindex_core::{
    Address, ChainClient, CheckpointStore, ChunkCommit, IndexerError, MemoryCheckpointStore,
    WithdrawalAddressSet,
};

pub fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

pub fn ev(node: u8, withdrawal: u8, block: u64, log_index: u64) -> WithdrawalAddressSet {
    WithdrawalAddressSet {
        node: addr(node),
        withdrawal_address: addr(withdrawal),
        block_number: block,
        log_index,
    }
}

#[derive(Default)]
pub struct MockChain {
    pub finalized: AtomicU64,
    events: Mutex<Vec<WithdrawalAddressSet>>,
    /// minipool → node
    pools: Mutex<HashMap<Address, Address>>,
    /// Every `(from_exclusive, to_inclusive)` event query, in call order.
    pub queries: Mutex<Vec<(u64, u64)>>,
    /// Number of `is_pool` / `pool_owner` calls.
    pub calls: AtomicUsize,
    /// Event queries whose range starts at or after this block fail.
    fail_queries_from: Mutex<Option<u64>>,
    /// Number of upcoming `finalized_height` calls that fail.
    fail_finalized: AtomicU32,
    /// When set, point calls fail.
    pub fail_calls: AtomicBool,
    /// When set, event queries wait for a notification before answering.
    pause: Mutex<Option<Arc<Notify>>>,
}

impl MockChain {
    pub fn new(finalized: u64) -> Self {
        let chain = Self::default();
        chain.finalized.store(finalized, Ordering::SeqCst);
        chain
    }

    pub fn with_events(self, events: Vec<WithdrawalAddressSet>) -> Self {
        *self.events.lock().unwrap() = events;
        self
    }

    pub fn with_pool(self, pool: Address, node: Address) -> Self {
        self.pools.lock().unwrap().insert(pool, node);
        self
    }

    pub fn push_event(&self, event: WithdrawalAddressSet) {
        self.events.lock().unwrap().push(event);
    }

    pub fn fail_queries_from(&self, block: Option<u64>) {
        *self.fail_queries_from.lock().unwrap() = block;
    }

    pub fn fail_next_finalized(&self, times: u32) {
        self.fail_finalized.store(times, Ordering::SeqCst);
    }

    pub fn pause_queries(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.pause.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn queries(&self) -> Vec<(u64, u64)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn finalized_height(&self) -> Result<u64, IndexerError> {
        let pending = self.fail_finalized.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_finalized.store(pending - 1, Ordering::SeqCst);
            return Err(IndexerError::ChainCall("finalized block unavailable".into()));
        }
        Ok(self.finalized.load(Ordering::SeqCst))
    }

    async fn withdrawal_address_events(
        &self,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<WithdrawalAddressSet>, IndexerError> {
        self.queries.lock().unwrap().push((from_exclusive, to_inclusive));

        let pause = self.pause.lock().unwrap().clone();
        if let Some(notify) = pause {
            notify.notified().await;
        }

        if let Some(fail_from) = *self.fail_queries_from.lock().unwrap() {
            if from_exclusive >= fail_from {
                return Err(IndexerError::ChainCall("eth_getLogs timed out".into()));
            }
        }
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.block_number > from_exclusive && e.block_number <= to_inclusive)
            .cloned()
            .collect())
    }

    async fn is_pool(&self, address: &Address) -> Result<bool, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(IndexerError::ChainCall("eth_call failed".into()));
        }
        Ok(self.pools.lock().unwrap().contains_key(address))
    }

    async fn pool_owner(&self, pool: &Address) -> Result<Address, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(IndexerError::ChainCall("eth_call failed".into()));
        }
        self.pools
            .lock()
            .unwrap()
            .get(pool)
            .copied()
            .ok_or_else(|| IndexerError::ChainCall(format!("{pool} is not a minipool")))
    }

    async fn new_heads(&self) -> Result<mpsc::Receiver<u64>, IndexerError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }
}

/// Memory store that can simulate a crash between the entry writes and the
/// cursor write, or fail every commit.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryCheckpointStore,
    /// Next commit writes its entries, then fails before moving the cursor.
    pub crash_before_cursor: AtomicBool,
    /// Every commit fails without writing anything.
    pub reject_commits: AtomicBool,
    /// Number of override lookups served.
    pub reads: AtomicUsize,
}

#[async_trait]
impl CheckpointStore for FaultyStore {
    async fn load_cursor(&self) -> Result<Option<u64>, IndexerError> {
        self.inner.load_cursor().await
    }

    async fn commit_chunk(&self, chunk: &ChunkCommit) -> Result<(), IndexerError> {
        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(IndexerError::Persistence("disk full".into()));
        }
        if self.crash_before_cursor.swap(false, Ordering::SeqCst) {
            // Cursor max(current, from_block) leaves it where it was.
            let entries_only = ChunkCommit {
                from_block: chunk.from_block,
                to_block: chunk.from_block,
                entries: chunk.entries.clone(),
            };
            self.inner.commit_chunk(&entries_only).await?;
            return Err(IndexerError::Persistence("crashed before cursor write".into()));
        }
        self.inner.commit_chunk(chunk).await
    }

    async fn withdrawal_address_for(&self, node: &Address) -> Result<Option<Address>, IndexerError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.withdrawal_address_for(node).await
    }
}
