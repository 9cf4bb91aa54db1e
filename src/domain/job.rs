//! Export job model
//!
//! A job is one asynchronous execution of a work item against the remote
//! export API. Status transitions only move forward; the orchestrator drops
//! the job from memory once its output is durably written and checkpointed.

use crate::domain::ids::{ExportJobId, WorkItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the remote system, not yet observed running
    Scheduled,
    /// Observed in a non-terminal state on the remote
    Running,
    /// Finished successfully; result location is available
    Completed,
    /// The remote reported a terminal failure
    Failed,
}

impl JobStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    // Rank encodes the forward-only ordering; terminal states share a rank.
    fn rank(&self) -> u8 {
        match self {
            JobStatus::Scheduled => 0,
            JobStatus::Running => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
}

/// One asynchronous execution of a work item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Work item this job executes
    pub work_item_id: WorkItemId,

    /// Opaque handle issued by the remote system
    pub job_id: ExportJobId,

    /// Current observed status
    pub status: JobStatus,

    /// When scheduling succeeded
    pub scheduled_at: DateTime<Utc>,

    /// Download location, populated only when status is Completed
    pub result_location: Option<String>,

    /// Remote-supplied failure message, populated only when status is Failed
    pub failure_reason: Option<String>,
}

impl Job {
    /// Create a freshly scheduled job
    pub fn scheduled(work_item_id: WorkItemId, job_id: ExportJobId) -> Self {
        Self {
            work_item_id,
            job_id,
            status: JobStatus::Scheduled,
            scheduled_at: Utc::now(),
            result_location: None,
            failure_reason: None,
        }
    }

    /// Advance to a new status, rejecting regressions.
    ///
    /// # Errors
    ///
    /// Returns an error if the transition would move backwards (e.g.
    /// Completed -> Running) or re-enter a terminal state.
    pub fn advance_to(&mut self, status: JobStatus) -> Result<(), String> {
        if self.status.is_terminal() && status != self.status {
            return Err(format!(
                "Job {} is terminal ({:?}), cannot transition to {:?}",
                self.job_id, self.status, status
            ));
        }
        if status.rank() < self.status.rank() {
            return Err(format!(
                "Job {} cannot regress from {:?} to {:?}",
                self.job_id, self.status, status
            ));
        }
        self.status = status;
        Ok(())
    }

    /// Mark completed with the remote result location
    pub fn complete(&mut self, result_location: impl Into<String>) -> Result<(), String> {
        self.advance_to(JobStatus::Completed)?;
        self.result_location = Some(result_location.into());
        Ok(())
    }

    /// Mark failed with the remote-supplied reason
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), String> {
        self.advance_to(JobStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn job() -> Job {
        Job::scheduled(
            WorkItemId::from_str("rpt-1").unwrap(),
            ExportJobId::from_str("J-1").unwrap(),
        )
    }

    #[test]
    fn test_new_job_is_scheduled() {
        let j = job();
        assert_eq!(j.status, JobStatus::Scheduled);
        assert!(j.result_location.is_none());
        assert!(j.failure_reason.is_none());
    }

    #[test]
    fn test_forward_transitions() {
        let mut j = job();
        j.advance_to(JobStatus::Running).unwrap();
        assert_eq!(j.status, JobStatus::Running);
        j.complete("https://files.example.com/r/1").unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert!(j.result_location.is_some());
    }

    #[test]
    fn test_skip_running_is_allowed() {
        // Fast jobs can complete before we ever observe them running.
        let mut j = job();
        j.complete("loc").unwrap();
        assert_eq!(j.status, JobStatus::Completed);
    }

    #[test]
    fn test_regression_rejected() {
        let mut j = job();
        j.advance_to(JobStatus::Running).unwrap();
        assert!(j.advance_to(JobStatus::Scheduled).is_err());
        assert_eq!(j.status, JobStatus::Running);
    }

    #[test]
    fn test_terminal_states_are_sticky() {
        let mut j = job();
        j.fail("quota exceeded").unwrap();
        assert!(j.advance_to(JobStatus::Running).is_err());
        assert!(j.advance_to(JobStatus::Completed).is_err());
        assert_eq!(j.status, JobStatus::Failed);
        assert_eq!(j.failure_reason.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_same_terminal_state_is_idempotent() {
        let mut j = job();
        j.advance_to(JobStatus::Completed).unwrap();
        assert!(j.advance_to(JobStatus::Completed).is_ok());
    }

    #[test]
    fn test_is_terminal() {
        assert!(!JobStatus::Scheduled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
