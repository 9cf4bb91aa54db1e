//! Run summary and outcome reporting
//!
//! Tracks what one run discovered, skipped, wrote, and failed, and
//! combines that with the ledger's history into the report surfaced to
//! the user. Nothing fails silently: every failure carries a
//! human-readable reason.

use crate::core::run::RunPhase;
use crate::core::write::WriteReport;
use crate::domain::WorkItem;
use std::time::Duration;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every pending item was attempted
    Completed,
    /// The execution budget (or a shutdown signal) stopped the run early;
    /// a checkpoint was saved and a resume run will pick up the rest
    IncompleteResumable,
}

/// One recorded per-item failure
#[derive(Debug, Clone)]
pub struct RunFailure {
    /// Item that failed
    pub work_item_id: String,

    /// Display name at failure time
    pub display_name: String,

    /// Phase the failure happened in
    pub phase: RunPhase,

    /// Human-readable reason
    pub reason: String,
}

/// Summary of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: String,

    /// Items discovered this run
    pub discovered: usize,

    /// Items skipped because their last export is still fresh
    pub skipped_fresh: usize,

    /// Jobs successfully scheduled
    pub scheduled: usize,

    /// Items fully processed this run
    pub succeeded: usize,

    /// Items that failed this run
    pub failed: usize,

    /// Results that required chunking
    pub chunked_reports: usize,

    /// Output pages written
    pub pages_written: usize,

    /// Data rows written
    pub rows_written: usize,

    /// Items ever completed, from the ledger
    pub historical_completed: usize,

    /// Duration of the run
    pub duration: Duration,

    /// Per-item failures with reasons
    pub failures: Vec<RunFailure>,
}

impl RunSummary {
    /// Create an empty summary for a run
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            discovered: 0,
            skipped_fresh: 0,
            scheduled: 0,
            succeeded: 0,
            failed: 0,
            chunked_reports: 0,
            pages_written: 0,
            rows_written: 0,
            historical_completed: 0,
            duration: Duration::from_secs(0),
            failures: Vec::new(),
        }
    }

    /// Record a fully processed item
    pub fn record_success(&mut self, report: &WriteReport) {
        self.succeeded += 1;
        self.pages_written += report.pages.len();
        self.rows_written += report.total_rows;
        if report.chunked {
            self.chunked_reports += 1;
        }
    }

    /// Record a per-item failure
    pub fn record_failure(&mut self, item: &WorkItem, phase: RunPhase, reason: String) {
        tracing::warn!(
            work_item_id = %item.id,
            phase = %phase,
            reason = %reason,
            "Work item failed"
        );
        self.failed += 1;
        self.failures.push(RunFailure {
            work_item_id: item.id.to_string(),
            display_name: item.display_name.clone(),
            phase,
            reason,
        });
    }

    /// Items attempted this run (skips excluded)
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Success rate in percent over attempted items
    pub fn success_rate(&self) -> f64 {
        if self.attempted() == 0 {
            return 100.0;
        }
        (self.succeeded as f64 / self.attempted() as f64) * 100.0
    }

    /// Whether every attempted item succeeded
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            discovered = self.discovered,
            skipped_fresh = self.skipped_fresh,
            scheduled = self.scheduled,
            succeeded = self.succeeded,
            failed = self.failed,
            chunked_reports = self.chunked_reports,
            pages_written = self.pages_written,
            rows_written = self.rows_written,
            historical_completed = self.historical_completed,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Run finished"
        );

        for failure in &self.failures {
            tracing::warn!(
                work_item_id = %failure.work_item_id,
                display_name = %failure.display_name,
                phase = %failure.phase,
                reason = %failure.reason,
                "Run failure"
            );
        }
    }
}

/// Final result of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// How the run ended
    pub status: RunStatus,

    /// What the run did
    pub summary: RunSummary,
}

impl RunOutcome {
    /// A run that attempted everything pending
    pub fn completed(summary: RunSummary) -> Self {
        Self {
            status: RunStatus::Completed,
            summary,
        }
    }

    /// A run stopped early with a checkpoint saved
    pub fn incomplete(summary: RunSummary) -> Self {
        Self {
            status: RunStatus::IncompleteResumable,
            summary,
        }
    }

    /// Whether the run must be resumed to finish
    pub fn needs_resume(&self) -> bool {
        self.status == RunStatus::IncompleteResumable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{PageName, WorkItemId};
    use std::str::FromStr;

    fn write_report(pages: usize, rows: usize, chunked: bool) -> WriteReport {
        WriteReport {
            pages: (1..=pages)
                .map(|i| PageName::new(format!("Page {i}")).unwrap())
                .collect(),
            total_rows: rows,
            chunked,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = RunSummary::new("run-1");
        assert_eq!(summary.attempted(), 0);
        assert_eq!(summary.success_rate(), 100.0);
        assert!(summary.is_successful());
    }

    #[test]
    fn test_record_success_accumulates() {
        let mut summary = RunSummary::new("run-1");
        summary.record_success(&write_report(1, 100, false));
        summary.record_success(&write_report(3, 2500, true));

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.pages_written, 4);
        assert_eq!(summary.rows_written, 2600);
        assert_eq!(summary.chunked_reports, 1);
    }

    #[test]
    fn test_record_failure() {
        let mut summary = RunSummary::new("run-1");
        let item = WorkItem::new(WorkItemId::from_str("rpt-1").unwrap(), "Weekly Sales");
        summary.record_failure(&item, RunPhase::Processing, "job failed".to_string());

        assert_eq!(summary.failed, 1);
        assert!(!summary.is_successful());
        assert_eq!(summary.failures[0].work_item_id, "rpt-1");
        assert_eq!(summary.failures[0].reason, "job failed");
    }

    #[test]
    fn test_success_rate() {
        let mut summary = RunSummary::new("run-1");
        summary.succeeded = 3;
        summary.failed = 1;
        assert_eq!(summary.success_rate(), 75.0);
    }

    #[test]
    fn test_outcome_needs_resume() {
        let done = RunOutcome::completed(RunSummary::new("run-1"));
        assert!(!done.needs_resume());

        let partial = RunOutcome::incomplete(RunSummary::new("run-1"));
        assert!(partial.needs_resume());
    }
}
