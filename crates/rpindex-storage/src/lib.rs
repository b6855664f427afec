//! rpindex-storage — durable backends for the checkpoint store.
//!
//! Backends:
//! - [`sqlite`] — SQLite via `sqlx` (embedded, single-file persistence)
//! - `rpindex_core::MemoryCheckpointStore` — in-memory (dev/testing)

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;
