//! Progress tracker
//!
//! Persists job-scheduling/processing progress and the completed-work
//! ledger through an injected [`StateStore`], so a run can resume
//! correctly after being forcibly terminated.

use crate::adapters::store::StateStore;
use crate::core::state::checkpoint::Checkpoint;
use crate::core::state::ledger::{CompletedLedger, FreshnessRecord, LedgerEntry};
use crate::domain::ids::WorkItemId;
use crate::domain::{HaulerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Storage key for the current checkpoint
const KEY_CHECKPOINT: &str = "checkpoint";
/// Storage key for the lightweight phase summary
const KEY_PHASE_SUMMARY: &str = "phase_summary";
/// Storage key for the completed-work ledger
const KEY_LEDGER: &str = "ledger";
/// Storage key for per-work-item freshness metadata
const KEY_FRESHNESS: &str = "freshness";

/// Lightweight summary persisted after every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSummary {
    /// Run the summary describes
    pub run_id: String,

    /// When the run finished (or bailed)
    pub finished_at: DateTime<Utc>,

    /// Final phase
    pub phase: String,

    /// Items fully processed this run
    pub succeeded: usize,

    /// Items failed this run
    pub failed: usize,

    /// Results that required chunking
    pub chunked_reports: usize,

    /// Success rate in percent
    pub success_rate: f64,

    /// Total items ever recorded in the ledger
    pub historical_completed: usize,
}

/// Persists run progress and the completed-work ledger
pub struct ProgressTracker {
    store: Arc<dyn StateStore>,
}

impl ProgressTracker {
    /// Create a tracker over a state store
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Overwrite the current checkpoint.
    ///
    /// Only the most recent phase/payload is retained; resume only ever
    /// needs "where did we last get to".
    pub async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        tracing::debug!(
            run_id = %checkpoint.run_id,
            phase = %checkpoint.phase,
            processed = checkpoint.metrics.items_processed,
            remaining = checkpoint.metrics.items_remaining,
            "Saving checkpoint"
        );
        let value = serde_json::to_value(checkpoint)?;
        self.store.set(KEY_CHECKPOINT, value).await
    }

    /// Read the most recent checkpoint, if any
    pub async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        match self.store.get(KEY_CHECKPOINT).await? {
            Some(value) => {
                let checkpoint = serde_json::from_value(value).map_err(|e| {
                    HaulerError::State(format!("Corrupt checkpoint state: {e}"))
                })?;
                Ok(Some(checkpoint))
            }
            None => Ok(None),
        }
    }

    /// Record a fully processed work item.
    ///
    /// Idempotent: recording the same item twice leaves exactly one ledger
    /// entry. Also refreshes the item's freshness record.
    pub async fn mark_complete(&self, entry: LedgerEntry) -> Result<()> {
        let mut ledger = self.load_ledger().await?;

        let freshness_update = entry
            .processed_at
            .map(|at| (entry.work_item_id.clone(), at, entry.row_count));

        ledger.upsert(entry);
        let value = serde_json::to_value(&ledger)?;
        self.store.set(KEY_LEDGER, value).await?;

        if let Some((id, at, rows)) = freshness_update {
            let mut freshness = self.load_freshness().await?;
            freshness.insert(
                id,
                FreshnessRecord {
                    last_updated: at,
                    row_count: rows,
                },
            );
            let map: HashMap<String, FreshnessRecord> = freshness
                .into_iter()
                .map(|(k, v)| (k.into_inner(), v))
                .collect();
            self.store.set(KEY_FRESHNESS, serde_json::to_value(map)?).await?;
        }

        Ok(())
    }

    /// Load the completed-work ledger (empty when absent)
    pub async fn load_ledger(&self) -> Result<CompletedLedger> {
        match self.store.get(KEY_LEDGER).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| HaulerError::State(format!("Corrupt ledger state: {e}"))),
            None => Ok(CompletedLedger::new()),
        }
    }

    /// Load per-item freshness metadata (empty when absent)
    pub async fn load_freshness(&self) -> Result<HashMap<WorkItemId, FreshnessRecord>> {
        match self.store.get(KEY_FRESHNESS).await? {
            Some(value) => {
                let raw: HashMap<String, FreshnessRecord> = serde_json::from_value(value)
                    .map_err(|e| HaulerError::State(format!("Corrupt freshness state: {e}")))?;
                let mut map = HashMap::new();
                for (k, v) in raw {
                    match WorkItemId::new(k) {
                        Ok(id) => {
                            map.insert(id, v);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping freshness record with bad id")
                        }
                    }
                }
                Ok(map)
            }
            None => Ok(HashMap::new()),
        }
    }

    /// Persist the lightweight phase summary
    pub async fn save_phase_summary(&self, summary: &PhaseSummary) -> Result<()> {
        let value = serde_json::to_value(summary)?;
        self.store.set(KEY_PHASE_SUMMARY, value).await
    }

    /// Read the last persisted phase summary, if any
    pub async fn load_phase_summary(&self) -> Result<Option<PhaseSummary>> {
        match self.store.get(KEY_PHASE_SUMMARY).await? {
            Some(value) => {
                let summary = serde_json::from_value(value).map_err(|e| {
                    HaulerError::State(format!("Corrupt phase summary state: {e}"))
                })?;
                Ok(Some(summary))
            }
            None => Ok(None),
        }
    }

    /// Remove all persisted state (checkpoint, summary, ledger, freshness)
    pub async fn clear(&self) -> Result<()> {
        self.store.delete(KEY_CHECKPOINT).await?;
        self.store.delete(KEY_PHASE_SUMMARY).await?;
        self.store.delete(KEY_LEDGER).await?;
        self.store.delete(KEY_FRESHNESS).await?;
        tracing::info!("Cleared persisted run state");
        Ok(())
    }

    /// Remove only the checkpoint (start-clean runs keep the ledger)
    pub async fn clear_checkpoint(&self) -> Result<()> {
        self.store.delete(KEY_CHECKPOINT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::JsonFileStore;
    use crate::core::state::checkpoint::{CheckpointMetrics, RunPhase};
    use crate::domain::ids::PageName;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn tracker(dir: &TempDir) -> ProgressTracker {
        ProgressTracker::new(Arc::new(JsonFileStore::new(dir.path()).unwrap()))
    }

    fn entry(id: &str) -> LedgerEntry {
        LedgerEntry {
            work_item_id: WorkItemId::from_str(id).unwrap(),
            display_name: format!("Report {id}"),
            pages: vec![PageName::new(format!("Report {id}")).unwrap()],
            row_count: 10,
            column_count: 3,
            processed_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_checkpoint_overwrite_round_trip() {
        let dir = TempDir::new().unwrap();
        let t = tracker(&dir);

        assert!(t.load_checkpoint().await.unwrap().is_none());

        let cp1 = Checkpoint::new(
            "run-1",
            RunPhase::Scheduling,
            serde_json::json!({}),
            CheckpointMetrics::default(),
        );
        t.save_checkpoint(&cp1).await.unwrap();

        let cp2 = Checkpoint::new(
            "run-1",
            RunPhase::Processing,
            serde_json::json!({"remaining": 3}),
            CheckpointMetrics {
                items_processed: 2,
                items_remaining: 3,
                ..CheckpointMetrics::default()
            },
        );
        t.save_checkpoint(&cp2).await.unwrap();

        let loaded = t.load_checkpoint().await.unwrap().unwrap();
        assert_eq!(loaded.phase, RunPhase::Processing);
        assert_eq!(loaded.metrics.items_processed, 2);
    }

    #[tokio::test]
    async fn test_mark_complete_idempotent() {
        let dir = TempDir::new().unwrap();
        let t = tracker(&dir);

        t.mark_complete(entry("rpt-1")).await.unwrap();
        t.mark_complete(entry("rpt-1")).await.unwrap();

        let ledger = t.load_ledger().await.unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_mark_complete_updates_freshness() {
        let dir = TempDir::new().unwrap();
        let t = tracker(&dir);

        t.mark_complete(entry("rpt-1")).await.unwrap();

        let freshness = t.load_freshness().await.unwrap();
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert_eq!(freshness.get(&id).unwrap().row_count, 10);
    }

    #[tokio::test]
    async fn test_state_survives_tracker_restart() {
        let dir = TempDir::new().unwrap();
        {
            let t = tracker(&dir);
            t.mark_complete(entry("rpt-1")).await.unwrap();
        }

        let t = tracker(&dir);
        let ledger = t.load_ledger().await.unwrap();
        assert!(ledger.contains(&WorkItemId::from_str("rpt-1").unwrap()));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let dir = TempDir::new().unwrap();
        let t = tracker(&dir);

        t.mark_complete(entry("rpt-1")).await.unwrap();
        let cp = Checkpoint::new(
            "run-1",
            RunPhase::Done,
            serde_json::json!({}),
            CheckpointMetrics::default(),
        );
        t.save_checkpoint(&cp).await.unwrap();

        t.clear().await.unwrap();

        assert!(t.load_checkpoint().await.unwrap().is_none());
        assert!(t.load_ledger().await.unwrap().is_empty());
        assert!(t.load_freshness().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_phase_summary_round_trip() {
        let dir = TempDir::new().unwrap();
        let t = tracker(&dir);

        let summary = PhaseSummary {
            run_id: "run-1".to_string(),
            finished_at: Utc::now(),
            phase: "done".to_string(),
            succeeded: 3,
            failed: 1,
            chunked_reports: 1,
            success_rate: 75.0,
            historical_completed: 3,
        };
        t.save_phase_summary(&summary).await.unwrap();

        let loaded = t.load_phase_summary().await.unwrap().unwrap();
        assert_eq!(loaded.succeeded, 3);
        assert_eq!(loaded.phase, "done");
    }
}
