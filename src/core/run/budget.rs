//! Wall-clock execution budget
//!
//! The budget is the run's only cancellation mechanism: it is checked at
//! every loop boundary so a timeout firing mid-operation can still reach
//! a checkpoint save before the host kills the process. The limit should
//! sit with a safety buffer below the host's hard kill limit.

use std::time::Duration;
use tokio::time::Instant;

/// Wall-clock budget for one run
#[derive(Debug, Clone)]
pub struct RunBudget {
    started: Instant,
    limit: Duration,
}

impl RunBudget {
    /// Start the clock with the given limit
    pub fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// Time spent so far
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether the budget is exhausted
    pub fn exceeded(&self) -> bool {
        self.elapsed() >= self.limit
    }

    /// Time left before exhaustion (zero when exceeded)
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    /// The instant at which the budget runs out.
    ///
    /// Passed into long waits so they wake exactly at exhaustion rather
    /// than oversleeping past it.
    pub fn deadline(&self) -> Instant {
        self.started + self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_budget_not_exceeded() {
        let budget = RunBudget::start(Duration::from_secs(300));
        assert!(!budget.exceeded());
        assert!(budget.remaining() > Duration::from_secs(299));
    }

    #[tokio::test]
    async fn test_zero_budget_exceeded_immediately() {
        let budget = RunBudget::start(Duration::ZERO);
        assert!(budget.exceeded());
        assert_eq!(budget.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_budget_exhausts_over_time() {
        let budget = RunBudget::start(Duration::from_millis(20));
        assert!(!budget.exceeded());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(budget.exceeded());
    }

    #[tokio::test]
    async fn test_deadline_matches_limit() {
        let budget = RunBudget::start(Duration::from_secs(10));
        let until_deadline = budget.deadline() - Instant::now();
        assert!(until_deadline <= Duration::from_secs(10));
        assert!(until_deadline > Duration::from_secs(9));
    }
}
