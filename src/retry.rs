//! Reconnection pacing policies.
//!
//! The subscriber retries failed connections forever; the policy only decides
//! how long to wait between attempts. The default, [`ImmediateRetry`], waits
//! not at all: connection failures trigger an instant new attempt with no
//! cap. [`ExponentialBackoff`] is available for deployments that prefer to
//! back off, without changing any other observable behaviour.

use std::time::Duration;

/// Decides the delay before each reconnection attempt.
pub trait RetryPolicy: Send {
    /// Delay to wait before the next attempt. Called once per attempt.
    fn next_delay(&mut self) -> Duration;

    /// Reset attempt state after a successful connection.
    fn reset(&mut self);
}

/// Retry immediately, forever. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateRetry;

impl RetryPolicy for ImmediateRetry {
    fn next_delay(&mut self) -> Duration {
        Duration::ZERO
    }

    fn reset(&mut self) {}
}

/// Exponential backoff: `base * 2^attempt`, capped at `max`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl ExponentialBackoff {
    /// Build a backoff policy growing from `base` up to `max`.
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max, attempt: 0 }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let millis = (self.base.as_millis() as u64)
            .saturating_mul(2u64.saturating_pow(self.attempt))
            .min(self.max.as_millis() as u64);
        self.attempt = self.attempt.saturating_add(1);
        Duration::from_millis(millis)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}
