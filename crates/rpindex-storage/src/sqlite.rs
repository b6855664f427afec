//! SQLite storage backend.
//!
//! Persists the sync cursor and the withdrawal-address index to a single
//! SQLite file. Each chunk is committed in one transaction; WAL mode lets the
//! lookup path read while a chunk is being written.
//!
//! # Usage
//! ```rust,no_run
//! use rpindex_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./index.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use rpindex_core::checkpoint::{CheckpointStore, ChunkCommit, CURSOR_KEY};
use rpindex_core::{Address, IndexEntry, IndexerError};

/// File name used inside the configured database directory.
pub const DB_FILE_NAME: &str = "rpindex.sqlite";

fn db_err(e: sqlx::Error) -> IndexerError {
    IndexerError::Persistence(e.to_string())
}

fn parse_stored(s: &str) -> Result<Address, IndexerError> {
    Address::parse(s).map_err(|e| IndexerError::Persistence(format!("corrupt address column: {e}")))
}

/// SQLite-backed checkpoint store.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./index.db"`) or a full
    /// SQLite URL (`"sqlite:./index.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, IndexerError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(db_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        debug!(path, "sqlite store opened");
        Ok(storage)
    }

    /// Create `dir` if needed and open `dir/rpindex.sqlite`.
    pub async fn open_dir(dir: impl AsRef<Path>) -> Result<Self, IndexerError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| IndexerError::Persistence(format!("creating {}: {e}", dir.display())))?;
        let file = dir.join(DB_FILE_NAME);
        Self::open(&file.to_string_lossy()).await
    }

    /// Open an in-memory SQLite database.
    ///
    /// Pinned to a single connection that is never recycled, since every
    /// `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self, IndexerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), IndexerError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sync_cursor (
                id           TEXT    NOT NULL PRIMARY KEY,
                block_number INTEGER NOT NULL,
                updated_at   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS withdrawal_addresses (
                node_address       TEXT    NOT NULL PRIMARY KEY,
                withdrawal_address TEXT    NOT NULL,
                block_number       INTEGER NOT NULL,
                updated_at         INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// All index entries, ordered by node address.
    pub async fn entries(&self) -> Result<Vec<IndexEntry>, IndexerError> {
        let rows = sqlx::query(
            "SELECT node_address, withdrawal_address, block_number
             FROM withdrawal_addresses ORDER BY node_address",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| {
                Ok(IndexEntry {
                    node: parse_stored(row.get("node_address"))?,
                    withdrawal_address: parse_stored(row.get("withdrawal_address"))?,
                    block_number: row.get::<i64, _>("block_number") as u64,
                })
            })
            .collect()
    }

    /// Number of nodes with an indexed withdrawal address.
    pub async fn entry_count(&self) -> Result<u64, IndexerError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM withdrawal_addresses")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }
}

// ─── CheckpointStore impl ────────────────────────────────────────────────────

#[async_trait]
impl CheckpointStore for SqliteStorage {
    async fn load_cursor(&self) -> Result<Option<u64>, IndexerError> {
        let row = sqlx::query("SELECT block_number FROM sync_cursor WHERE id = ?")
            .bind(CURSOR_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.map(|r| r.get::<i64, _>("block_number") as u64))
    }

    async fn commit_chunk(&self, chunk: &ChunkCommit) -> Result<(), IndexerError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for entry in &chunk.entries {
            sqlx::query(
                "INSERT INTO withdrawal_addresses
                 (node_address, withdrawal_address, block_number, updated_at)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT(node_address) DO UPDATE SET
                     withdrawal_address = excluded.withdrawal_address,
                     block_number       = excluded.block_number,
                     updated_at         = excluded.updated_at",
            )
            .bind(entry.node.to_canonical())
            .bind(entry.withdrawal_address.to_canonical())
            .bind(entry.block_number as i64)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        sqlx::query(
            "INSERT INTO sync_cursor (id, block_number, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 block_number = MAX(sync_cursor.block_number, excluded.block_number),
                 updated_at   = excluded.updated_at",
        )
        .bind(CURSOR_KEY)
        .bind(chunk.to_block as i64)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        debug!(
            from = chunk.from_block,
            to = chunk.to_block,
            entries = chunk.entries.len(),
            "chunk persisted"
        );
        Ok(())
    }

    async fn withdrawal_address_for(&self, node: &Address) -> Result<Option<Address>, IndexerError> {
        let row = sqlx::query(
            "SELECT withdrawal_address FROM withdrawal_addresses WHERE node_address = ?",
        )
        .bind(node.to_canonical())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|r| parse_stored(r.get("withdrawal_address")))
            .transpose()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
