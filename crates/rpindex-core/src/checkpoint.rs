//! Checkpoint store: persists the sync cursor and the derived index.
//!
//! A chunk of work (the index entries derived from a block range plus the new
//! cursor) is committed as one unit. Readers see either the state before a
//! chunk or the state after it, never a half-applied chunk, and a crash between
//! chunks simply leaves the cursor at the previous boundary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::address::Address;
use crate::error::IndexerError;
use crate::types::IndexEntry;

/// Key of the single cursor row.
pub const CURSOR_KEY: &str = "withdrawal_address_block";

/// Everything derived from the block range `(from_block, to_block]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkCommit {
    /// Exclusive lower bound (the cursor before this chunk).
    pub from_block: u64,
    /// Inclusive upper bound; becomes the new cursor.
    pub to_block: u64,
    /// At most one entry per node, already resolved last-writer-wins.
    pub entries: Vec<IndexEntry>,
}

/// Durable storage for the cursor and the withdrawal-address index.
///
/// Implementations include [`MemoryCheckpointStore`] and the SQLite backend in
/// `rpindex-storage`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the committed cursor, `None` if nothing was ever committed.
    async fn load_cursor(&self) -> Result<Option<u64>, IndexerError>;

    /// Write the chunk's entries and advance the cursor to `chunk.to_block`,
    /// atomically. A stored cursor never moves backwards.
    async fn commit_chunk(&self, chunk: &ChunkCommit) -> Result<(), IndexerError>;

    /// Look up the withdrawal address override for `node`.
    async fn withdrawal_address_for(&self, node: &Address) -> Result<Option<Address>, IndexerError>;
}

/// Cursor bookkeeping on top of a [`CheckpointStore`].
#[derive(Clone)]
pub struct CheckpointManager {
    store: Arc<dyn CheckpointStore>,
    genesis_block: u64,
}

impl CheckpointManager {
    pub fn new(store: Arc<dyn CheckpointStore>, genesis_block: u64) -> Self {
        Self { store, genesis_block }
    }

    /// The committed cursor, or the genesis block when none exists yet.
    pub async fn cursor(&self) -> Result<u64, IndexerError> {
        Ok(self.store.load_cursor().await?.unwrap_or(self.genesis_block))
    }

    /// Commit a chunk.
    pub async fn commit(&self, chunk: &ChunkCommit) -> Result<(), IndexerError> {
        self.store.commit_chunk(chunk).await?;
        tracing::debug!(
            from = chunk.from_block,
            to = chunk.to_block,
            entries = chunk.entries.len(),
            "chunk committed"
        );
        Ok(())
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }
}

// ─── In-memory store (for testing) ────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    cursor: Option<u64>,
    entries: HashMap<Address, IndexEntry>,
}

/// In-memory checkpoint store for tests and ephemeral runs.
///
/// A chunk is applied under one write lock, which gives readers the same
/// all-or-nothing view a database transaction would.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    state: RwLock<MemoryState>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, ordered by node address.
    pub fn entries(&self) -> Result<Vec<IndexEntry>, IndexerError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut entries: Vec<_> = state.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.node);
        Ok(entries)
    }
}

fn poisoned() -> IndexerError {
    IndexerError::Persistence("memory store lock poisoned".into())
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load_cursor(&self) -> Result<Option<u64>, IndexerError> {
        Ok(self.state.read().map_err(|_| poisoned())?.cursor)
    }

    async fn commit_chunk(&self, chunk: &ChunkCommit) -> Result<(), IndexerError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        for entry in &chunk.entries {
            state.entries.insert(entry.node, entry.clone());
        }
        state.cursor = Some(state.cursor.map_or(chunk.to_block, |c| c.max(chunk.to_block)));
        Ok(())
    }

    async fn withdrawal_address_for(&self, node: &Address) -> Result<Option<Address>, IndexerError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.entries.get(node).map(|e| e.withdrawal_address))
    }
}
