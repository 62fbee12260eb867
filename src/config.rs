//! Pool configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};
use crate::retry::RetryPolicy;

/// Client pool configuration.
///
/// Immutable once handed to [`crate::ClientPoolManager`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Store address
    pub address: String,
    /// Number of retries after a failed attempt (0 = no retry)
    pub retry: u32,
    /// Number of clients (one worker per client)
    pub concurrency: usize,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// Inbound statement queue depth per worker
    pub channel_capacity: usize,
    /// First retry delay in milliseconds
    pub retry_initial_delay_ms: u64,
    /// Retry delay cap in milliseconds
    pub retry_max_delay_ms: u64,
    /// Retry backoff multiplier
    pub retry_multiplier: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            retry: 0,
            concurrency: 1,
            user: String::new(),
            password: String::new(),
            channel_capacity: 1,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 10_000,
            retry_multiplier: 2.0,
        }
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfig")
            .field("address", &self.address)
            .field("retry", &self.retry)
            .field("concurrency", &self.concurrency)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("channel_capacity", &self.channel_capacity)
            .field("retry_initial_delay_ms", &self.retry_initial_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("retry_multiplier", &self.retry_multiplier)
            .finish()
    }
}

impl PoolConfig {
    /// Create a new configuration for the given address.
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Self::default()
        }
    }

    /// Set the number of clients.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the credentials used by every client.
    pub fn credentials(mut self, user: &str, password: &str) -> Self {
        self.user = user.to_string();
        self.password = password.to_string();
        self
    }

    /// Set the number of retries per statement.
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    /// Set the inbound queue depth per worker.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the retry backoff window.
    pub fn retry_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_initial_delay_ms = u64::try_from(initial.as_millis()).unwrap_or(u64::MAX);
        self.retry_max_delay_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Check the configuration before any client is created.
    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(PoolError::Config("address must not be empty".to_string()));
        }
        if self.concurrency == 0 {
            return Err(PoolError::Config(
                "concurrency must be greater than 0".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(PoolError::Config(
                "channel_capacity must be greater than 0".to_string(),
            ));
        }
        if self.retry_max_delay_ms < self.retry_initial_delay_ms {
            return Err(PoolError::Config(format!(
                "retry_max_delay_ms ({}) is below retry_initial_delay_ms ({})",
                self.retry_max_delay_ms, self.retry_initial_delay_ms
            )));
        }
        if !self.retry_multiplier.is_finite() || self.retry_multiplier < 1.0 {
            return Err(PoolError::Config(format!(
                "retry_multiplier must be >= 1.0, got {}",
                self.retry_multiplier
            )));
        }
        Ok(())
    }

    /// Retry policy derived from the retry fields.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            multiplier: self.retry_multiplier,
        }
    }
}
