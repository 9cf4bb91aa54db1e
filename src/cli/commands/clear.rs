//! Clear-state command implementation
//!
//! Removes the checkpoint, run summary, completed ledger, and freshness
//! records. The next run reprocesses everything.

use crate::adapters::store::create_store;
use crate::config::load_config;
use crate::core::state::ProgressTracker;
use clap::Args;

/// Arguments for the clear-state command
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ClearArgs {
    /// Execute the clear-state command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration error: {e}");
                return Ok(2);
            }
        };

        if !self.yes {
            print!(
                "Clear all persisted state in {} (the next run reprocesses everything)? [y/N] ",
                config.state.dir
            );
            use std::io::Write;
            std::io::stdout().flush()?;
            let mut answer = String::new();
            std::io::stdin().read_line(&mut answer)?;
            if !answer.trim().eq_ignore_ascii_case("y") {
                println!("Aborted.");
                return Ok(0);
            }
        }

        let store = create_store(&config.state)?;
        let tracker = ProgressTracker::new(store);
        tracker.clear().await?;

        println!("✅ Persisted state cleared");
        Ok(0)
    }
}
