//! Circuit breaker for the remote export API
//!
//! Tracks consecutive failures of the remote API and gates whether new
//! calls are attempted. Rate-limit responses are flow control and never
//! count toward the failure threshold; only deadline/transport/5xx-class
//! failures do. Conflating the two would trip the breaker permanently
//! under normal, expected throttling.

use crate::config::BreakerConfig;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Classification of a failed call, as seen by the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Timeout, connection failure, or 5xx; counts toward the threshold
    Fault,
    /// HTTP 429: flow control, never counted
    RateLimited,
}

/// Breaker state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakerState {
    /// Normal operation, calls allowed
    Closed,
    /// Tripped, calls refused until the cooldown elapses
    Open,
    /// Cooldown elapsed, exactly one trial call allowed
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    /// Set while the single half-open trial call is outstanding
    trial_in_flight: bool,
}

/// Circuit breaker guarding calls to a consistently failing dependency
///
/// State machine: Closed → (threshold consecutive faults) → Open →
/// (cooldown elapses) → HalfOpen, which admits exactly one trial call;
/// that call's outcome decides Closed or Open again.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    /// Create a breaker from configuration
    pub fn new(config: &BreakerConfig) -> Self {
        Self::with_settings(config.failure_threshold, config.cooldown())
    }

    /// Create a breaker with explicit settings
    pub fn with_settings(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure_at: None,
                trial_in_flight: false,
            }),
            failure_threshold,
            cooldown,
        }
    }

    /// Check whether a call may be attempted right now.
    ///
    /// While open, returns false until the cooldown has elapsed since the
    /// last failure; then the breaker moves to half-open and this method
    /// returns true exactly once until the trial's outcome is recorded.
    pub fn can_execute(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open => {
                let cooled_down = inner
                    .last_failure_at
                    .map(|at| at.elapsed() >= self.cooldown)
                    .unwrap_or(true);
                if cooled_down {
                    tracing::info!("Circuit breaker half-open, admitting one trial call");
                    inner.state = BreakerState::HalfOpen;
                    inner.trial_in_flight = true;
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen => {
                if inner.trial_in_flight {
                    false
                } else {
                    inner.trial_in_flight = true;
                    true
                }
            }
        }
    }

    /// Record a successful call, closing the breaker and resetting the count
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != BreakerState::Closed {
            tracing::info!("Circuit breaker closing after successful call");
        }
        inner.state = BreakerState::Closed;
        inner.failure_count = 0;
        inner.last_failure_at = None;
        inner.trial_in_flight = false;
    }

    /// Record a failed call.
    ///
    /// Rate-limit failures never count toward the threshold; they only
    /// release an outstanding half-open trial so the next call can be
    /// admitted. A counted fault during half-open re-opens the breaker
    /// immediately; in closed state the breaker opens once the
    /// consecutive-failure threshold is reached.
    pub fn record_failure(&self, kind: FailureKind) {
        if kind == FailureKind::RateLimited {
            self.inner.lock().unwrap().trial_in_flight = false;
            return;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.failure_count += 1;
        inner.last_failure_at = Some(Instant::now());
        inner.trial_in_flight = false;

        match inner.state {
            BreakerState::HalfOpen => {
                tracing::warn!("Circuit breaker trial call failed, re-opening");
                inner.state = BreakerState::Open;
            }
            BreakerState::Closed if inner.failure_count >= self.failure_threshold => {
                tracing::warn!(
                    failure_count = inner.failure_count,
                    threshold = self.failure_threshold,
                    "Circuit breaker opening"
                );
                inner.state = BreakerState::Open;
            }
            _ => {}
        }
    }

    /// Current consecutive-failure count
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().unwrap().failure_count
    }

    /// Whether the breaker is currently refusing calls
    pub fn is_open(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.state == BreakerState::Open
    }

    /// Remaining cooldown time (zero if not open)
    pub fn remaining_cooldown(&self) -> Duration {
        let inner = self.inner.lock().unwrap();
        match (inner.state, inner.last_failure_at) {
            (BreakerState::Open, Some(at)) => self.cooldown.saturating_sub(at.elapsed()),
            _ => Duration::ZERO,
        }
    }
}
