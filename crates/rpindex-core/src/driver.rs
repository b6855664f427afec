//! Trigger layer: turns new-head notifications into sync runs.
//!
//! Each head spawns a run attempt. If a run is already in flight the head is
//! dropped; the next head re-evaluates against the then-current finalized
//! height. A failed run is retried with bounded exponential backoff before the
//! driver gives up and waits for the next head.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::IndexerError;
use crate::retry::RetryConfig;
use crate::sync::{SyncEngine, SyncOutcome};

pub struct SyncDriver {
    engine: Arc<SyncEngine>,
    retry: RetryConfig,
}

impl SyncDriver {
    pub fn new(engine: Arc<SyncEngine>, retry: RetryConfig) -> Self {
        Self { engine, retry }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Run the engine to the finalized height, retrying retryable failures.
    ///
    /// The single-flight guard is released between attempts, so a retry that
    /// finds another run in flight stops with [`SyncOutcome::AlreadyRunning`].
    pub async fn trigger(&self) -> Result<SyncOutcome, IndexerError> {
        let mut backoff = self.retry.backoff();
        loop {
            match self.engine.on_new_head().await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() => {
                    match backoff.next() {
                        Some(delay) => {
                            tracing::warn!(
                                attempt = backoff.retries(),
                                delay_ms = delay.as_millis() as u64,
                                error = %e,
                                "sync failed, retrying"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::error!(
                                retries = backoff.retries(),
                                error = %e,
                                "sync failed, giving up until next head"
                            );
                            return Err(e);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "sync failed");
                    return Err(e);
                }
            }
        }
    }

    /// Consume head notifications until the stream closes.
    pub async fn run(self: Arc<Self>, mut heads: mpsc::Receiver<u64>) {
        while let Some(head) = heads.recv().await {
            if self.engine.is_running() {
                tracing::debug!(head, "sync in flight, dropping head");
                continue;
            }
            tracing::debug!(head, "new head");
            let driver = Arc::clone(&self);
            tokio::spawn(async move {
                // Failures are already logged inside `trigger`.
                let _ = driver.trigger().await;
            });
        }
        tracing::info!("new-head stream closed, sync driver stopping");
    }
}
