//! Per-statement retry policy.

use std::time::Duration;

use rand::Rng;

/// Bounded retry budget with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Backoff multiplier
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }

    /// Whether another attempt is allowed after `attempt` (0-based) failed.
    #[inline]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before retrying after `attempt` (0-based) failed.
    ///
    /// `initial * multiplier^attempt`, capped at `max_delay`, with ±25% jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let capped = self.base_delay_ms(attempt);
        let jitter = rand::thread_rng().gen_range(-0.25..=0.25) * capped;
        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }

    fn base_delay_ms(&self, attempt: u32) -> f64 {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        base.min(self.max_delay.as_millis() as f64)
    }
}
