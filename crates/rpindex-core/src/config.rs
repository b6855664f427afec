//! Sync configuration and its fluent builder.
//!
//! ```rust
//! use rpindex_core::config::SyncConfigBuilder;
//!
//! let config = SyncConfigBuilder::new()
//!     .genesis_block(13_325_233)
//!     .max_query_range(500)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_query_range, 500);
//! ```

use crate::error::IndexerError;
use crate::retry::RetryConfig;

/// Block at which RocketStorage was deployed; nothing before it is relevant.
pub const ROCKET_STORAGE_GENESIS_BLOCK: u64 = 13_325_233;

/// Default maximum width of one `eth_getLogs` range.
pub const DEFAULT_MAX_QUERY_RANGE: u64 = 1000;

/// Configuration for the sync engine and its trigger layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Cursor value used when the store has none.
    pub genesis_block: u64,
    /// Maximum number of blocks covered by one event query / chunk.
    pub max_query_range: u64,
    /// Retry policy applied by the trigger layer after a failed run.
    pub retry: RetryConfig,
}

impl SyncConfig {
    /// A zero `max_query_range` would never advance the cursor.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.max_query_range == 0 {
            return Err(IndexerError::Validation(
                "max_query_range must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            genesis_block: ROCKET_STORAGE_GENESIS_BLOCK,
            max_query_range: DEFAULT_MAX_QUERY_RANGE,
            retry: RetryConfig::default(),
        }
    }
}

/// Fluent builder for [`SyncConfig`].
#[derive(Default)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the block the cursor starts from on an empty store.
    pub fn genesis_block(mut self, block: u64) -> Self {
        self.config.genesis_block = block;
        self
    }

    /// Set the number of blocks per `eth_getLogs` chunk.
    pub fn max_query_range(mut self, range: u64) -> Self {
        self.config.max_query_range = range;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the `SyncConfig`.
    pub fn build(self) -> Result<SyncConfig, IndexerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
