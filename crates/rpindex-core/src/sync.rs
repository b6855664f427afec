//! Sync engine. Folds `NodeWithdrawalAddressSet` events into the index.
//!
//! # Run
//! Starting from the committed cursor, walk towards the target height in
//! chunks of at most `max_query_range` blocks. For each chunk:
//!   - fetch the events in `(cursor, chunk_end]`
//!   - fold them in ledger order, last writer wins per node
//!   - commit entries and the new cursor as one unit
//!
//! A failure aborts the run and leaves the cursor at the last committed chunk.
//! Replaying a chunk rewrites identical entries, so a crash between the
//! entry writes and the cursor write is recovered by running again.
//!
//! At most one run is in flight. A run requested while another holds the
//! [`SingleFlight`] guard is dropped, not queued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::chain::ChainClient;
use crate::checkpoint::{CheckpointManager, CheckpointStore, ChunkCommit};
use crate::config::SyncConfig;
use crate::error::IndexerError;
use crate::types::{IndexEntry, WithdrawalAddressSet};

// ─── Single-flight guard ─────────────────────────────────────────────────────

/// Compare-and-swap guard allowing at most one holder at a time.
#[derive(Debug, Default)]
pub struct SingleFlight {
    running: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or `None` if someone else holds it.
    pub fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightGuard { flag: &self.running })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the [`SingleFlight`] on drop, including on error paths.
#[derive(Debug)]
pub struct FlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Summary of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Cursor when the run started.
    pub start_cursor: u64,
    /// Cursor when the run finished.
    pub cursor: u64,
    /// Number of chunks committed.
    pub chunks: u64,
    /// Number of events folded in.
    pub events: u64,
}

/// Result of asking the engine to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// Another run held the guard; this request was dropped.
    AlreadyRunning,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Catches the checkpoint store up to the ledger's finalized height.
pub struct SyncEngine {
    config: SyncConfig,
    client: Arc<dyn ChainClient>,
    checkpoint: CheckpointManager,
    flight: SingleFlight,
}

impl SyncEngine {
    /// Fails with `Validation` if `config` does not pass [`SyncConfig::validate`].
    pub fn new(
        config: SyncConfig,
        client: Arc<dyn ChainClient>,
        store: Arc<dyn CheckpointStore>,
    ) -> Result<Self, IndexerError> {
        config.validate()?;
        let checkpoint = CheckpointManager::new(store, config.genesis_block);
        Ok(Self {
            config,
            client,
            checkpoint,
            flight: SingleFlight::new(),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The committed cursor (genesis if nothing was committed yet).
    pub async fn cursor(&self) -> Result<u64, IndexerError> {
        self.checkpoint.cursor().await
    }

    /// Whether a run currently holds the guard.
    pub fn is_running(&self) -> bool {
        self.flight.is_running()
    }

    /// Advance the cursor to `target`, unless a run is already in flight.
    pub async fn run_once(&self, target: u64) -> Result<SyncOutcome, IndexerError> {
        let Some(_guard) = self.flight.try_acquire() else {
            tracing::debug!(target, "sync already in flight, dropping request");
            return Ok(SyncOutcome::AlreadyRunning);
        };
        self.sync_to(target).await.map(SyncOutcome::Completed)
    }

    /// New-head trigger: sync to the current finalized height.
    ///
    /// The guard is taken before the finalized height is fetched, so two heads
    /// arriving back to back never start two runs.
    pub async fn on_new_head(&self) -> Result<SyncOutcome, IndexerError> {
        let Some(_guard) = self.flight.try_acquire() else {
            tracing::debug!("sync already in flight, dropping new-head trigger");
            return Ok(SyncOutcome::AlreadyRunning);
        };
        let target = self.client.finalized_height().await?;
        self.sync_to(target).await.map(SyncOutcome::Completed)
    }

    async fn sync_to(&self, target: u64) -> Result<SyncReport, IndexerError> {
        let start_cursor = self.checkpoint.cursor().await?;
        let mut report = SyncReport {
            start_cursor,
            cursor: start_cursor,
            chunks: 0,
            events: 0,
        };

        if start_cursor >= target {
            tracing::debug!(cursor = start_cursor, target, "index up to date");
            return Ok(report);
        }

        while report.cursor < target {
            let from = report.cursor;
            let to = from.saturating_add(self.config.max_query_range).min(target);

            tracing::info!(from, to, target, "processing withdrawal addresses");

            let events = self
                .client
                .withdrawal_address_events(from, to)
                .await
                .map_err(|e| {
                    tracing::warn!(from, to, error = %e, "event query failed");
                    e
                })?;
            let event_count = events.len() as u64;

            let chunk = fold_chunk(from, to, events);
            self.checkpoint
                .commit(&chunk)
                .await
                .map_err(|e| {
                    tracing::warn!(from, to, error = %e, "chunk commit failed");
                    e
                })?;

            report.cursor = to;
            report.chunks += 1;
            report.events += event_count;
        }

        tracing::info!(
            start = report.start_cursor,
            cursor = report.cursor,
            chunks = report.chunks,
            events = report.events,
            "sync complete"
        );
        Ok(report)
    }
}

/// Fold the events of `(from, to]` into one commit, last writer wins per node.
pub fn fold_chunk(from: u64, to: u64, mut events: Vec<WithdrawalAddressSet>) -> ChunkCommit {
    events.sort_by_key(WithdrawalAddressSet::position);

    let mut latest: HashMap<_, IndexEntry> = HashMap::with_capacity(events.len());
    for event in &events {
        tracing::debug!(
            node = %event.node,
            withdrawal_address = %event.withdrawal_address,
            block = event.block_number,
            "updating withdrawal address"
        );
        latest.insert(event.node, IndexEntry::from(event));
    }

    let mut entries: Vec<_> = latest.into_values().collect();
    entries.sort_by_key(|e| e.node);
    ChunkCommit {
        from_block: from,
        to_block: to,
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn ev(node: u8, withdrawal: u8, block: u64, log_index: u64) -> WithdrawalAddressSet {
        WithdrawalAddressSet {
            node: Address::new([node; 20]),
            withdrawal_address: Address::new([withdrawal; 20]),
            block_number: block,
            log_index,
        }
    }

    #[test]
    fn fold_last_writer_wins_in_ledger_order() {
        // Delivered out of order; ledger order is (10,1) < (10,4) < (12,0).
        let events = vec![ev(1, 0xcc, 12, 0), ev(1, 0xaa, 10, 1), ev(1, 0xbb, 10, 4)];
        let chunk = fold_chunk(0, 20, events);
        assert_eq!(chunk.entries.len(), 1);
        assert_eq!(chunk.entries[0].withdrawal_address, Address::new([0xcc; 20]));
        assert_eq!(chunk.entries[0].block_number, 12);
        assert_eq!((chunk.from_block, chunk.to_block), (0, 20));
    }

    #[test]
    fn fold_keeps_one_entry_per_node() {
        let events = vec![ev(1, 0xaa, 5, 0), ev(2, 0xbb, 5, 1), ev(1, 0xdd, 6, 0)];
        let chunk = fold_chunk(0, 10, events);
        assert_eq!(chunk.entries.len(), 2);
        assert_eq!(chunk.entries[0].node, Address::new([1; 20]));
        assert_eq!(chunk.entries[0].withdrawal_address, Address::new([0xdd; 20]));
        assert_eq!(chunk.entries[1].withdrawal_address, Address::new([0xbb; 20]));
    }

    #[test]
    fn fold_empty_chunk_still_advances() {
        let chunk = fold_chunk(100, 200, vec![]);
        assert!(chunk.entries.is_empty());
        assert_eq!(chunk.to_block, 200);
    }

    #[test]
    fn single_flight_excludes_second_holder() {
        let flight = SingleFlight::new();
        let guard = flight.try_acquire().expect("first acquire");
        assert!(flight.is_running());
        assert!(flight.try_acquire().is_none());
        drop(guard);
        assert!(!flight.is_running());
        assert!(flight.try_acquire().is_some());
    }
}
