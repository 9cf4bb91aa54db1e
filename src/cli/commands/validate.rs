//! Validate-config command implementation

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        println!("Validating configuration: {config_path}");

        match load_config(config_path) {
            Ok(config) => {
                println!("✅ Configuration is valid");
                println!();
                println!("  API:               {}", config.api.base_url);
                println!("  Sink target:       {:?}", config.sink.target);
                println!("  Max rows per page: {}", config.sink.max_rows_per_page);
                println!("  State dir:         {}", config.state.dir);
                println!(
                    "  Execution budget:  {}s",
                    config.run.max_execution_seconds
                );
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   {e}");
                Ok(2)
            }
        }
    }
}
