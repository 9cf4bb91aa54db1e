// Hauler - Bulk Report Export Orchestrator
// Copyright (c) 2025 Hauler Contributors
// Licensed under the MIT License

//! # Hauler - Resilient Bulk Report Export
//!
//! Hauler pulls asynchronous report exports from rate-limited partner
//! APIs and materializes them into a paginated tabular sink (CSV files
//! per page, or any store with a hard per-page row cap).
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Scheduling** asynchronous export jobs under strict rate limits
//! - **Polling** job status with adaptive backoff
//! - **Isolating** cascading failures with a circuit breaker
//! - **Chunking** oversized result sets across bounded output pages
//! - **Checkpointing** progress so a run resumes correctly after the
//!   host's execution-time limit kills the process
//!
//! ## Architecture
//!
//! Hauler follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (breaker, process, write, state, run)
//! - [`adapters`] - External integrations (export API, sink, state store)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hauler::config::load_config;
//! use hauler::core::run::RunCoordinator;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("hauler.toml")?;
//!     let coordinator = RunCoordinator::new(config)?;
//!
//!     let (_tx, shutdown) = watch::channel(false);
//!     let outcome = coordinator.run(false, shutdown).await?;
//!
//!     println!("Wrote {} pages", outcome.summary.pages_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Resumable Runs
//!
//! The coordinator checks its wall-clock budget at every loop boundary.
//! When the budget runs out it saves a checkpoint and returns an
//! incomplete-but-resumable outcome instead of erroring:
//!
//! ```rust,no_run
//! # use hauler::config::load_config;
//! # use hauler::core::run::RunCoordinator;
//! # use tokio::sync::watch;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let coordinator = RunCoordinator::new(load_config("hauler.toml")?)?;
//! # let (_tx, shutdown) = watch::channel(false);
//! let outcome = coordinator.run(true, shutdown).await?;
//! if outcome.needs_resume() {
//!     println!("Budget exhausted; run again with resume to continue");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Hauler uses the [`domain::HaulerError`] hierarchy for all errors. Per-
//! item failures are recorded into the run summary and never abort the
//! run; only configuration errors and a circuit already open on the first
//! call do.
//!
//! ## Logging
//!
//! Hauler uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(pages = 3, "Wrote result");
//! warn!(work_item_id = "rpt-1", "Export job failed");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
