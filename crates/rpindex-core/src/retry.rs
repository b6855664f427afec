//! Backoff schedule shared by the sync driver and the HTTP transport.
//!
//! A [`RetryConfig`] describes the schedule; [`RetryConfig::backoff`] hands out
//! a fresh [`Backoff`] for each operation, which yields one delay per retry
//! and then runs dry.

use std::time::Duration;

/// How often, and how patiently, a failed sync run or RPC request is retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first failure. Zero disables retrying.
    pub max_retries: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single wait.
    pub max_backoff: Duration,
    /// Growth factor between consecutive waits.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    /// 3 retries: 500ms, 1s, 2s.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Start a new schedule for one operation.
    pub fn backoff(&self) -> Backoff {
        Backoff {
            config: self.clone(),
            retries: 0,
            next: self.initial_backoff.min(self.max_backoff),
        }
    }
}

/// Delays for one operation's retries, in order.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: RetryConfig,
    retries: u32,
    next: Duration,
}

impl Backoff {
    /// Retries handed out so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retries >= self.config.max_retries {
            return None;
        }
        self.retries += 1;
        let delay = self.next;
        self.next = delay
            .mul_f64(self.config.multiplier.max(1.0))
            .min(self.config.max_backoff);
        Some(delay)
    }
}
