//! rpindex-core — the incremental withdrawal-address index.
//!
//! # Architecture
//!
//! ```text
//! new heads ─► SyncDriver ─► SyncEngine ─► ChainClient (eth_getLogs)
//!                               │
//!                               └────────► CheckpointStore (cursor + entries)
//!
//! lookup request ─► LookupService ─► ChainClient (eth_call)
//!                                └─► CheckpointStore (overrides)
//! ```

pub mod address;
pub mod chain;
pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod error;
pub mod lookup;
pub mod retry;
pub mod sync;
pub mod types;

pub use address::Address;
pub use chain::ChainClient;
pub use checkpoint::{CheckpointManager, CheckpointStore, ChunkCommit, MemoryCheckpointStore};
pub use config::{SyncConfig, SyncConfigBuilder};
pub use driver::SyncDriver;
pub use error::IndexerError;
pub use lookup::LookupService;
pub use retry::{Backoff, RetryConfig};
pub use sync::{SyncEngine, SyncOutcome, SyncReport};
pub use types::{IndexEntry, LookupResult, WithdrawalAddressSet};
