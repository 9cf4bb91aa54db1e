//! Run command implementation
//!
//! Executes one export run: discover, schedule, poll, download, write,
//! checkpoint.

use crate::config::load_config;
use crate::core::run::{RunCoordinator, RunStatus};
use clap::Args;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Resume from the last checkpoint instead of starting clean
    #[arg(long)]
    pub resume: bool,

    /// Dry run mode - full pipeline against an in-memory sink
    #[arg(long)]
    pub dry_run: bool,

    /// Override the execution budget, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub max_minutes: Option<u64>,

    /// Override the output directory for the CSV sink
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Configuration loading failed");
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        if let Some(minutes) = self.max_minutes {
            tracing::info!(minutes, "Overriding execution budget from CLI");
            config.run.max_execution_seconds = minutes * 60;
        }

        if let Some(ref dir) = self.output_dir {
            tracing::info!(output_dir = %dir, "Overriding output directory from CLI");
            config.sink.output_dir = dir.clone();
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2);
        }

        if self.dry_run {
            println!("🔍 DRY RUN MODE - results land in an in-memory sink");
            println!();
        }

        if !self.yes && !self.dry_run {
            println!("Run configuration:");
            println!("  API:               {}", config.api.base_url);
            println!("  Output:            {}", config.sink.output_dir);
            println!("  Max rows per page: {}", config.sink.max_rows_per_page);
            println!(
                "  Execution budget:  {}s",
                config.run.max_execution_seconds
            );
            println!("  Resume:            {}", self.resume);
            println!();
            print!("Proceed? [y/N] ");

            use std::io::Write;
            std::io::stdout().flush()?;
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer)?;
            if !answer.trim().eq_ignore_ascii_case("y") {
                println!("Aborted.");
                return Ok(0);
            }
        }

        let budget = Duration::from_secs(config.run.max_execution_seconds);
        let coordinator = RunCoordinator::new(config)?.with_execution_budget(budget);

        let outcome = coordinator.run(self.resume, shutdown_signal).await?;
        let summary = &outcome.summary;

        println!();
        println!("Run {}", summary.run_id);
        println!("  Discovered:     {}", summary.discovered);
        println!("  Skipped fresh:  {}", summary.skipped_fresh);
        println!("  Succeeded:      {}", summary.succeeded);
        println!("  Failed:         {}", summary.failed);
        println!("  Chunked:        {}", summary.chunked_reports);
        println!("  Pages written:  {}", summary.pages_written);
        println!("  Rows written:   {}", summary.rows_written);
        println!("  Success rate:   {:.2}%", summary.success_rate());
        println!("  Duration:       {}s", summary.duration.as_secs());

        if !summary.failures.is_empty() {
            println!();
            println!("Failures:");
            for failure in &summary.failures {
                println!(
                    "  - {} ({}) during {}: {}",
                    failure.display_name, failure.work_item_id, failure.phase, failure.reason
                );
            }
        }

        match outcome.status {
            RunStatus::IncompleteResumable => {
                println!();
                println!("⏸  Run incomplete: budget exhausted. Re-run with --resume to continue.");
                Ok(3)
            }
            RunStatus::Completed if summary.failed > 0 => Ok(1),
            RunStatus::Completed => Ok(0),
        }
    }
}
