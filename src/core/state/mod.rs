//! Run-state persistence
//!
//! Checkpoints, the completed-work ledger, and the progress tracker that
//! persists both through an injected state store.

pub mod checkpoint;
pub mod ledger;
pub mod tracker;

pub use checkpoint::{Checkpoint, CheckpointMetrics, JobsSummary, RunPhase};
pub use ledger::{CompletedLedger, FreshnessRecord, LedgerEntry};
pub use tracker::{PhaseSummary, ProgressTracker};
