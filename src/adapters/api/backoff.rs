//! Retry and polling delay schedules
//!
//! Pure delay computations, kept separate from the client so the shape of
//! every backoff curve is testable without a network.

use crate::config::{PollingConfig, RetryConfig};
use std::time::Duration;

/// Exponential backoff schedule for transport/5xx retries
///
/// Delay for attempt `n` (0-based) is
/// `min(initial_delay * multiplier^n, max_delay)`: monotonically
/// non-decreasing and capped.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl RetrySchedule {
    /// Build a schedule from retry configuration
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.backoff_multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Delay before retry attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay ceiling
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

/// Adaptive polling schedule for job status checks
///
/// The first `quick_threshold` attempts back off geometrically from
/// `initial_delay` up to `max_delay`; later attempts use the constant
/// `quick_delay`. Early polls stay off fresh jobs' backs, while jobs that
/// have proven slow are checked frequently rather than left to idle out a
/// long backoff interval.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    quick_threshold: u32,
    quick_delay: Duration,
}

impl PollSchedule {
    /// Build a schedule from polling configuration
    pub fn new(config: &PollingConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            multiplier: config.multiplier,
            max_delay: Duration::from_millis(config.max_delay_ms),
            quick_threshold: config.quick_threshold,
            quick_delay: Duration::from_millis(config.quick_delay_ms),
        }
    }

    /// Delay before poll attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt < self.quick_threshold {
            let millis =
                self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
            let capped = millis.min(self.max_delay.as_millis() as f64);
            Duration::from_millis(capped as u64)
        } else {
            self.quick_delay
        }
    }
}
