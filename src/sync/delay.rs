//! Randomised politeness delays
//!
//! Every pause between two requests to the jobs website is drawn uniformly
//! from a `DelayRange`. Tests use `DelayRange::disabled()`.

use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Inclusive range a delay is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// A range that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draws one delay from the range
    ///
    /// A range with `max <= min` always yields `min`.
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
    }

    /// Sleeps for one sampled delay
    pub async fn sleep(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::debug!("Waiting {:?} before next request", delay);
            tokio::time::sleep(delay).await;
        }
    }

    /// Sleeps for one sampled delay unless `cancel` fires first
    ///
    /// Returns `false` when the wait was cut short by cancellation.
    pub async fn sleep_or_cancel(&self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        let delay = self.sample();
        if delay.is_zero() {
            return true;
        }

        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
