//! Wire models for the export API
//!
//! Serde structs for the remote responses plus the scheduling parameters
//! we pass through. These types stay inside the adapter; the client maps
//! them into domain types before returning.

use crate::config::RunConfig;
use serde::Deserialize;

/// One entry from the discover endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemRecord {
    /// Remote identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    /// Items the credential cannot export are listed but flagged
    #[serde(default = "default_accessible")]
    pub accessible: bool,
}

fn default_accessible() -> bool {
    true
}

/// Response from the job-status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Remote status string; `completed` and `failed` are terminal,
    /// anything else means still running
    pub status: String,

    /// Download location, present once the job completes
    #[serde(default)]
    pub result_location: Option<String>,

    /// Remote failure message, present when the job failed
    #[serde(default)]
    pub error: Option<String>,
}

/// Terminal classification of a status string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Job finished successfully
    Completed,
    /// Job failed on the remote side
    Failed,
    /// Any other status string
    StillRunning,
}

impl JobStatusResponse {
    /// Classify the remote status string.
    ///
    /// Unknown strings are deliberately treated as "still running": remote
    /// systems add intermediate states over time, and only the two
    /// terminal states have contractual meaning.
    pub fn kind(&self) -> StatusKind {
        match self.status.to_lowercase().as_str() {
            "completed" => StatusKind::Completed,
            "failed" => StatusKind::Failed,
            _ => StatusKind::StillRunning,
        }
    }
}

/// Optional parameters passed through to the schedule endpoint
#[derive(Debug, Clone, Default)]
pub struct ExportParams {
    /// Export window start (RFC3339)
    pub date_from: Option<String>,

    /// Export window end (RFC3339)
    pub date_to: Option<String>,

    /// Remote-side status filter
    pub status_filter: Option<String>,
}

impl ExportParams {
    /// Build params from run configuration
    pub fn from_run_config(config: &RunConfig) -> Self {
        Self {
            date_from: config.date_from.clone(),
            date_to: config.date_to.clone(),
            status_filter: config.status_filter.clone(),
        }
    }

    /// Query pairs for the schedule request
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(ref from) = self.date_from {
            pairs.push(("date_from", from.as_str()));
        }
        if let Some(ref to) = self.date_to {
            pairs.push(("date_to", to.as_str()));
        }
        if let Some(ref status) = self.status_filter {
            pairs.push(("status", status.as_str()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_item_record_accessible_defaults_true() {
        let record: WorkItemRecord =
            serde_json::from_str(r#"{"id": "rpt-1", "name": "Weekly Sales"}"#).unwrap();
        assert!(record.accessible);
    }

    #[test]
    fn test_status_classification() {
        let mk = |status: &str| JobStatusResponse {
            status: status.to_string(),
            result_location: None,
            error: None,
        };
        assert_eq!(mk("completed").kind(), StatusKind::Completed);
        assert_eq!(mk("COMPLETED").kind(), StatusKind::Completed);
        assert_eq!(mk("failed").kind(), StatusKind::Failed);
        assert_eq!(mk("queued").kind(), StatusKind::StillRunning);
        assert_eq!(mk("processing").kind(), StatusKind::StillRunning);
        assert_eq!(mk("anything-else").kind(), StatusKind::StillRunning);
    }

    #[test]
    fn test_export_params_query_pairs() {
        let params = ExportParams {
            date_from: Some("2025-01-01T00:00:00Z".to_string()),
            date_to: None,
            status_filter: Some("active".to_string()),
        };
        let pairs = params.query_pairs();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0, "date_from");
        assert_eq!(pairs[1], ("status", "active"));
    }

    #[test]
    fn test_empty_params_have_no_pairs() {
        assert!(ExportParams::default().query_pairs().is_empty());
    }
}
