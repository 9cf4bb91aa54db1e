//! Checkpoint and run-phase types
//!
//! A checkpoint is the most recent persisted marker of run progress. It is
//! overwritten on every phase transition, read once at the start of a
//! resumed run, and never partially applied.

use crate::domain::Job;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of the orchestration state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Listing work items from the remote
    Discovering,
    /// Scheduling export jobs
    Scheduling,
    /// Polling, downloading, and writing results
    Processing,
    /// Producing the run summary
    Summarizing,
    /// Run finished
    Done,
    /// Run stopped early on the execution budget or a shutdown signal
    TimedOut,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunPhase::Discovering => "discovering",
            RunPhase::Scheduling => "scheduling",
            RunPhase::Processing => "processing",
            RunPhase::Summarizing => "summarizing",
            RunPhase::Done => "done",
            RunPhase::TimedOut => "timed_out",
        };
        write!(f, "{s}")
    }
}

/// Cumulative counters carried in every checkpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    /// Items discovered this run
    pub items_discovered: usize,

    /// Items skipped as still fresh
    pub items_skipped: usize,

    /// Items fully processed this run
    pub items_processed: usize,

    /// Items that failed this run
    pub items_failed: usize,

    /// Items not yet processed when the checkpoint was written
    pub items_remaining: usize,
}

/// Persisted snapshot of run progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Run this checkpoint belongs to
    pub run_id: String,

    /// Phase the run was in when the checkpoint was written
    pub phase: RunPhase,

    /// When the checkpoint was written
    pub saved_at: DateTime<Utc>,

    /// Phase-specific payload (job summaries, remaining ids, reason tags)
    pub payload: serde_json::Value,

    /// Cumulative counters
    pub metrics: CheckpointMetrics,
}

impl Checkpoint {
    /// Create a checkpoint for the given phase
    pub fn new(
        run_id: impl Into<String>,
        phase: RunPhase,
        payload: serde_json::Value,
        metrics: CheckpointMetrics,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            phase,
            saved_at: Utc::now(),
            payload,
            metrics,
        }
    }
}

/// How many job ids to keep at each end of a summarized collection
const SUMMARY_SAMPLE: usize = 5;

/// Bounded summary of a large in-flight job collection
///
/// Hundreds of scheduled jobs would bloat every checkpoint write, and
/// resume only needs the completed-work ledger plus the phase marker, so
/// monitoring data is stored as a count with a head/tail sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsSummary {
    /// Total jobs in the collection
    pub total: usize,

    /// First few job ids
    pub head: Vec<String>,

    /// Last few job ids (empty when head already covers everything)
    pub tail: Vec<String>,
}

impl JobsSummary {
    /// Summarize a job collection
    pub fn of(jobs: &[Job]) -> Self {
        let total = jobs.len();
        if total <= SUMMARY_SAMPLE * 2 {
            return Self {
                total,
                head: jobs.iter().map(|j| j.job_id.to_string()).collect(),
                tail: Vec::new(),
            };
        }

        Self {
            total,
            head: jobs
                .iter()
                .take(SUMMARY_SAMPLE)
                .map(|j| j.job_id.to_string())
                .collect(),
            tail: jobs
                .iter()
                .skip(total - SUMMARY_SAMPLE)
                .map(|j| j.job_id.to_string())
                .collect(),
        }
    }
}
