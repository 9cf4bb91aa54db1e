//! Run coordinator - top-level orchestration of the export run
//!
//! Discovers work items, schedules export jobs under rate-limit pacing,
//! polls them to completion, downloads and writes results, and
//! checkpoints its own progress so a run can resume correctly after the
//! host kills the process.

use crate::adapters::api::{ExportApiClient, ExportParams};
use crate::adapters::sink::{create_sink, PageSink};
use crate::adapters::store::{create_store, StateStore};
use crate::config::HaulerConfig;
use crate::core::breaker::CircuitBreaker;
use crate::core::process::DataProcessor;
use crate::core::run::budget::RunBudget;
use crate::core::run::summary::{RunOutcome, RunSummary};
use crate::core::state::{
    Checkpoint, CheckpointMetrics, CompletedLedger, FreshnessRecord, JobsSummary, LedgerEntry,
    PhaseSummary, ProgressTracker, RunPhase,
};
use crate::core::write::{OutputWriter, WriteReport};
use crate::domain::ids::WorkItemId;
use crate::domain::{ApiError, Job, Result, WorkItem};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Result of the scheduling phase
enum ScheduleOutcome {
    /// All pending items attempted; scheduled jobs in discovery order
    Jobs(Vec<(WorkItem, Job)>),
    /// Budget or shutdown fired at a batch boundary
    Stopped(&'static str),
}

/// Result of processing one scheduled job
enum ItemOutcome {
    /// Output written and ledger updated
    Done(WriteReport),
    /// The execution deadline fired while waiting on the remote
    Deadline,
    /// Terminal failure for this item; the run continues
    Failed(String),
}

/// Top-level control loop for one export run
pub struct RunCoordinator {
    config: HaulerConfig,
    client: ExportApiClient,
    processor: DataProcessor,
    writer: OutputWriter,
    tracker: ProgressTracker,
    budget_limit: Duration,
}

impl RunCoordinator {
    /// Build a coordinator and its components from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the API client, sink, or state store cannot be
    /// constructed.
    pub fn new(config: HaulerConfig) -> Result<Self> {
        let sink = create_sink(&config.sink, config.application.dry_run)?;
        let store = create_store(&config.state)?;
        Self::from_parts(config, sink, store)
    }

    /// Build a coordinator over explicit sink and store implementations
    ///
    /// # Errors
    ///
    /// Returns an error if the API client cannot be constructed.
    pub fn from_parts(
        config: HaulerConfig,
        sink: Arc<dyn PageSink>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self> {
        let breaker = Arc::new(CircuitBreaker::new(&config.api.breaker));
        let client = ExportApiClient::new(config.api.clone(), breaker)?;
        let writer = OutputWriter::new(sink, &config.sink);
        let processor = DataProcessor::new(&config.sink);
        let tracker = ProgressTracker::new(store);
        let budget_limit = config.run.max_execution();

        Ok(Self {
            config,
            client,
            processor,
            writer,
            tracker,
            budget_limit,
        })
    }

    /// Override the execution budget (CLI/testing hook)
    pub fn with_execution_budget(mut self, limit: Duration) -> Self {
        self.budget_limit = limit;
        self
    }

    /// The progress tracker backing this coordinator
    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Execute one run.
    ///
    /// Phases: discovering → scheduling → processing → summarizing → done,
    /// with a timeout exit from any phase. Per-item failures are recorded
    /// and never abort the run; only discovery failure (including a circuit
    /// already open on the first call) aborts outright. Exhausting the
    /// execution budget is not an error: the run checkpoints and returns an
    /// incomplete-but-resumable outcome.
    pub async fn run(
        &self,
        resume: bool,
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunOutcome> {
        let budget = RunBudget::start(self.budget_limit);

        // Resume keeps the prior run id; a clean start drops the stale
        // checkpoint but keeps the ledger, which drives freshness skips.
        let prior = if resume {
            self.tracker.load_checkpoint().await?
        } else {
            self.tracker.clear_checkpoint().await?;
            None
        };

        let run_id = match prior {
            Some(cp) => {
                tracing::info!(
                    run_id = %cp.run_id,
                    phase = %cp.phase,
                    saved_at = %cp.saved_at,
                    "Resuming from checkpoint"
                );
                cp.run_id
            }
            None => uuid::Uuid::new_v4().to_string(),
        };

        let mut summary = RunSummary::new(run_id.clone());

        // Phase: discovering
        let ledger = self.tracker.load_ledger().await?;
        let freshness = self.tracker.load_freshness().await?;
        summary.historical_completed = ledger.len();

        self.checkpoint(&run_id, RunPhase::Discovering, serde_json::json!({}), &summary, 0)
            .await;

        let items = self
            .client
            .discover_work_items()
            .await
            .map_err(crate::domain::HaulerError::from)?;
        summary.discovered = items.len();

        let threshold = self.config.run.freshness_threshold();
        let now = Utc::now();
        let mut pending = Vec::new();
        for item in items {
            if is_fresh(&item.id, &ledger, &freshness, now, threshold) {
                tracing::debug!(work_item_id = %item.id, "Skipping fresh work item");
                summary.skipped_fresh += 1;
            } else {
                pending.push(item);
            }
        }

        tracing::info!(
            discovered = summary.discovered,
            skipped_fresh = summary.skipped_fresh,
            pending = pending.len(),
            "Discovery complete"
        );

        if pending.is_empty() {
            return self.finish(&run_id, summary, &budget).await;
        }

        // Phase: scheduling
        let jobs = match self
            .schedule_pending(&run_id, &pending, &mut summary, &budget, &shutdown)
            .await?
        {
            ScheduleOutcome::Jobs(jobs) => jobs,
            ScheduleOutcome::Stopped(reason) => {
                // Nothing has been processed yet: everything still
                // pending (minus recorded failures) remains.
                let remaining = pending.len().saturating_sub(summary.failed);
                return self
                    .bail_incomplete(
                        &run_id,
                        reason,
                        summary,
                        pending.iter().map(|i| i.id.to_string()).collect(),
                        remaining,
                        &budget,
                    )
                    .await;
            }
        };

        // Phase: processing
        let total_jobs = jobs.len();
        self.checkpoint(
            &run_id,
            RunPhase::Processing,
            serde_json::to_value(JobsSummary::of(
                &jobs.iter().map(|(_, j)| j.clone()).collect::<Vec<_>>(),
            ))
            .unwrap_or_default(),
            &summary,
            total_jobs,
        )
        .await;

        let mut handled = 0usize;
        for index in 0..total_jobs {
            if let Some(reason) = should_stop(&budget, &shutdown) {
                let remaining_ids: Vec<String> =
                    jobs[index..].iter().map(|(i, _)| i.id.to_string()).collect();
                let remaining = remaining_ids.len();
                return self
                    .bail_incomplete(&run_id, reason, summary, remaining_ids, remaining, &budget)
                    .await;
            }

            let (item, mut job) = jobs[index].clone();
            match self.process_job(&item, &mut job, &budget).await {
                ItemOutcome::Done(report) => {
                    summary.record_success(&report);
                }
                ItemOutcome::Deadline => {
                    let remaining_ids: Vec<String> =
                        jobs[index..].iter().map(|(i, _)| i.id.to_string()).collect();
                    let remaining = remaining_ids.len();
                    return self
                        .bail_incomplete(
                            &run_id,
                            "timeout",
                            summary,
                            remaining_ids,
                            remaining,
                            &budget,
                        )
                        .await;
                }
                ItemOutcome::Failed(reason) => {
                    summary.record_failure(&item, RunPhase::Processing, reason);
                }
            }

            handled += 1;
            if handled % self.config.run.progress_save_interval == 0 {
                self.checkpoint(
                    &run_id,
                    RunPhase::Processing,
                    serde_json::json!({"handled": handled}),
                    &summary,
                    total_jobs - handled,
                )
                .await;
            }
        }

        self.finish(&run_id, summary, &budget).await
    }

    /// Schedule pending items as jobs with rate-limit pacing.
    ///
    /// Stops at a batch boundary when the budget or a shutdown signal
    /// fires.
    async fn schedule_pending(
        &self,
        run_id: &str,
        pending: &[WorkItem],
        summary: &mut RunSummary,
        budget: &RunBudget,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<ScheduleOutcome> {
        let params = ExportParams::from_run_config(&self.config.run);
        let batch_size = self.config.run.schedule_batch_size;
        let item_delay = Duration::from_millis(self.config.run.schedule_item_delay_ms);
        let batch_delay = Duration::from_millis(self.config.run.schedule_batch_delay_ms);

        self.checkpoint(
            run_id,
            RunPhase::Scheduling,
            serde_json::json!({"pending": pending.len()}),
            summary,
            pending.len(),
        )
        .await;

        let mut jobs: Vec<(WorkItem, Job)> = Vec::new();

        for (index, item) in pending.iter().enumerate() {
            match self.client.schedule_export(&item.id, &params).await {
                Ok(job) => {
                    jobs.push((item.clone(), job));
                    summary.scheduled += 1;
                }
                Err(e @ ApiError::CircuitOpen) if index == 0 => {
                    // The remote is already refusing the first call of the
                    // run; nothing useful can happen, abort outright.
                    return Err(e.into());
                }
                Err(e) => {
                    summary.record_failure(item, RunPhase::Scheduling, e.to_string());
                }
            }

            if summary.scheduled > 0
                && summary.scheduled % self.config.run.progress_save_interval == 0
            {
                let job_list: Vec<Job> = jobs.iter().map(|(_, j)| j.clone()).collect();
                self.checkpoint(
                    run_id,
                    RunPhase::Scheduling,
                    serde_json::to_value(JobsSummary::of(&job_list)).unwrap_or_default(),
                    summary,
                    pending.len() - (index + 1),
                )
                .await;
            }

            let last = index + 1 == pending.len();
            if !last {
                if (index + 1) % batch_size == 0 {
                    if let Some(reason) = should_stop(budget, shutdown) {
                        return Ok(ScheduleOutcome::Stopped(reason));
                    }
                    tokio::time::sleep(batch_delay).await;
                } else {
                    tokio::time::sleep(item_delay).await;
                }
            }
        }

        tracing::info!(
            scheduled = jobs.len(),
            failed = summary.failed,
            "Scheduling complete"
        );

        Ok(ScheduleOutcome::Jobs(jobs))
    }

    /// Poll, download, parse, write, and record one job.
    ///
    /// The job is dropped by the caller once this returns: after a
    /// successful ledger update nothing in memory is needed again.
    async fn process_job(
        &self,
        item: &WorkItem,
        job: &mut Job,
        budget: &RunBudget,
    ) -> ItemOutcome {
        match self
            .client
            .wait_for_completion(job, Some(budget.deadline()))
            .await
        {
            Ok(()) => {}
            Err(ApiError::DeadlineExceeded) => return ItemOutcome::Deadline,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        }

        let location = match job.result_location.clone() {
            Some(location) => location,
            None => {
                return ItemOutcome::Failed(
                    "job completed without a result location".to_string(),
                )
            }
        };

        let payload = match self.client.download_result(&location).await {
            Ok(payload) => payload,
            Err(e) => return ItemOutcome::Failed(format!("download failed: {e}")),
        };

        let table = match self.processor.parse_result(&payload) {
            Ok(table) => table,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        let plan = match self.processor.plan_chunks(&table) {
            Ok(plan) => plan,
            Err(e) => return ItemOutcome::Failed(e.to_string()),
        };

        let report = match self.writer.write(item, &table, plan.as_ref()).await {
            Ok(report) => report,
            Err(e) => return ItemOutcome::Failed(format!("write failed: {e}")),
        };

        let entry = LedgerEntry {
            work_item_id: item.id.clone(),
            display_name: item.display_name.clone(),
            pages: report.pages.clone(),
            row_count: table.row_count(),
            column_count: table.column_count(),
            processed_at: Some(Utc::now()),
        };

        if let Err(e) = self.tracker.mark_complete(entry).await {
            // Pages are in place (writes are idempotent), but without a
            // ledger entry the item must be re-attempted next run.
            return ItemOutcome::Failed(format!("output written but ledger update failed: {e}"));
        }

        ItemOutcome::Done(report)
    }

    /// Summarize and finish a run that attempted everything pending
    async fn finish(
        &self,
        run_id: &str,
        mut summary: RunSummary,
        budget: &RunBudget,
    ) -> Result<RunOutcome> {
        self.checkpoint(run_id, RunPhase::Summarizing, serde_json::json!({}), &summary, 0)
            .await;

        match self.tracker.load_ledger().await {
            Ok(ledger) => summary.historical_completed = ledger.len(),
            Err(e) => tracing::warn!(error = %e, "Could not reload ledger for summary"),
        }

        summary.duration = budget.elapsed();

        let phase_summary = PhaseSummary {
            run_id: run_id.to_string(),
            finished_at: Utc::now(),
            phase: RunPhase::Done.to_string(),
            succeeded: summary.succeeded,
            failed: summary.failed,
            chunked_reports: summary.chunked_reports,
            success_rate: summary.success_rate(),
            historical_completed: summary.historical_completed,
        };

        // Summary persistence failure never rolls back completed work.
        if let Err(e) = self.tracker.save_phase_summary(&phase_summary).await {
            tracing::warn!(error = %e, "Failed to persist run summary");
        }

        self.checkpoint(run_id, RunPhase::Done, serde_json::json!({}), &summary, 0)
            .await;

        summary.log_summary();
        Ok(RunOutcome::completed(summary))
    }

    /// Checkpoint and return a partial, resumable outcome.
    ///
    /// This is the controlled early return for budget exhaustion and
    /// shutdown signals; it is never surfaced as an error.
    async fn bail_incomplete(
        &self,
        run_id: &str,
        reason: &str,
        mut summary: RunSummary,
        remaining_ids: Vec<String>,
        remaining: usize,
        budget: &RunBudget,
    ) -> Result<RunOutcome> {
        tracing::warn!(
            reason,
            processed = summary.attempted(),
            remaining,
            "Stopping early, checkpointing for resume"
        );

        let payload = serde_json::json!({
            "reason": reason,
            "remaining_ids": remaining_ids,
        });
        let checkpoint = Checkpoint::new(
            run_id,
            RunPhase::TimedOut,
            payload,
            self.metrics(&summary, remaining),
        );
        if let Err(e) = self.tracker.save_checkpoint(&checkpoint).await {
            tracing::error!(error = %e, "Failed to save timeout checkpoint");
        }

        summary.duration = budget.elapsed();
        summary.log_summary();
        Ok(RunOutcome::incomplete(summary))
    }

    /// Write a checkpoint, logging (not propagating) persistence failures
    async fn checkpoint(
        &self,
        run_id: &str,
        phase: RunPhase,
        payload: serde_json::Value,
        summary: &RunSummary,
        remaining: usize,
    ) {
        let checkpoint = Checkpoint::new(run_id, phase, payload, self.metrics(summary, remaining));
        if let Err(e) = self.tracker.save_checkpoint(&checkpoint).await {
            tracing::warn!(error = %e, phase = %phase, "Checkpoint save failed");
        }
    }

    fn metrics(&self, summary: &RunSummary, remaining: usize) -> CheckpointMetrics {
        CheckpointMetrics {
            items_discovered: summary.discovered,
            items_skipped: summary.skipped_fresh,
            items_processed: summary.attempted(),
            items_failed: summary.failed,
            items_remaining: remaining,
        }
    }
}

/// Whether the run must stop at this loop boundary
fn should_stop(budget: &RunBudget, shutdown: &watch::Receiver<bool>) -> Option<&'static str> {
    if budget.exceeded() {
        return Some("timeout");
    }
    if *shutdown.borrow() {
        return Some("shutdown");
    }
    None
}

/// Freshness policy for previously completed items.
///
/// An item is fresh (skippable) when its recorded timestamp is younger
/// than the threshold. The ledger timestamp wins; the freshness record is
/// the fallback for entries migrated from older state. Items with no
/// timestamp at all are conservatively treated as stale and reprocessed.
fn is_fresh(
    id: &WorkItemId,
    ledger: &CompletedLedger,
    freshness: &HashMap<WorkItemId, FreshnessRecord>,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
) -> bool {
    let Some(entry) = ledger.get(id) else {
        return false;
    };

    let stamp = entry
        .processed_at
        .or_else(|| freshness.get(id).map(|r| r.last_updated));

    match stamp {
        Some(t) => now.signed_duration_since(t) < threshold,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::PageName;
    use std::str::FromStr;

    fn entry(id: &str, processed_at: Option<DateTime<Utc>>) -> LedgerEntry {
        LedgerEntry {
            work_item_id: WorkItemId::from_str(id).unwrap(),
            display_name: format!("Report {id}"),
            pages: vec![PageName::new(format!("Report {id}")).unwrap()],
            row_count: 10,
            column_count: 2,
            processed_at,
        }
    }

    #[test]
    fn test_unknown_item_is_not_fresh() {
        let ledger = CompletedLedger::new();
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert!(!is_fresh(
            &id,
            &ledger,
            &HashMap::new(),
            Utc::now(),
            chrono::Duration::hours(24)
        ));
    }

    #[test]
    fn test_recent_item_is_fresh() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", Some(Utc::now() - chrono::Duration::hours(1))));
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert!(is_fresh(
            &id,
            &ledger,
            &HashMap::new(),
            Utc::now(),
            chrono::Duration::hours(24)
        ));
    }

    #[test]
    fn test_stale_item_is_reprocessed() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", Some(Utc::now() - chrono::Duration::hours(48))));
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert!(!is_fresh(
            &id,
            &ledger,
            &HashMap::new(),
            Utc::now(),
            chrono::Duration::hours(24)
        ));
    }

    #[test]
    fn test_timestampless_item_is_treated_as_stale() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", None));
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert!(!is_fresh(
            &id,
            &ledger,
            &HashMap::new(),
            Utc::now(),
            chrono::Duration::hours(24)
        ));
    }

    #[test]
    fn test_freshness_record_is_the_fallback() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", None));

        let id = WorkItemId::from_str("rpt-1").unwrap();
        let mut freshness = HashMap::new();
        freshness.insert(
            id.clone(),
            FreshnessRecord {
                last_updated: Utc::now() - chrono::Duration::hours(2),
                row_count: 10,
            },
        );

        assert!(is_fresh(
            &id,
            &ledger,
            &freshness,
            Utc::now(),
            chrono::Duration::hours(24)
        ));
    }
}
