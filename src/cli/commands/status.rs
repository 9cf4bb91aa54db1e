//! Status command implementation
//!
//! Shows the last checkpoint, the last run summary, and the completed
//! ledger.

use crate::adapters::store::create_store;
use crate::config::load_config;
use crate::core::state::ProgressTracker;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Show every ledger entry instead of a count
    #[arg(long)]
    pub verbose: bool,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        let store = create_store(&config.state)?;
        let tracker = ProgressTracker::new(store);

        println!("Hauler state ({})", config.state.dir);
        println!();

        match tracker.load_checkpoint().await? {
            Some(cp) => {
                println!("Checkpoint:");
                println!("  Run:       {}", cp.run_id);
                println!("  Phase:     {}", cp.phase);
                println!("  Saved at:  {}", cp.saved_at.to_rfc3339());
                println!(
                    "  Progress:  {} processed, {} failed, {} remaining",
                    cp.metrics.items_processed, cp.metrics.items_failed, cp.metrics.items_remaining
                );
            }
            None => println!("Checkpoint: none"),
        }
        println!();

        match tracker.load_phase_summary().await? {
            Some(summary) => {
                println!("Last run:");
                println!("  Run:          {}", summary.run_id);
                println!("  Finished at:  {}", summary.finished_at.to_rfc3339());
                println!("  Succeeded:    {}", summary.succeeded);
                println!("  Failed:       {}", summary.failed);
                println!("  Chunked:      {}", summary.chunked_reports);
                println!("  Success rate: {:.2}%", summary.success_rate);
            }
            None => println!("Last run: none recorded"),
        }
        println!();

        let ledger = tracker.load_ledger().await?;
        println!("Completed ledger: {} item(s)", ledger.len());
        if self.verbose {
            for entry in ledger.entries() {
                let processed = entry
                    .processed_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "unknown".to_string());
                println!(
                    "  - {} ({}): {} rows, {} page(s), processed {}",
                    entry.display_name,
                    entry.work_item_id,
                    entry.row_count,
                    entry.pages.len(),
                    processed
                );
            }
        }

        Ok(0)
    }
}
