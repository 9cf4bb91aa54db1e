//! Init command implementation
//!
//! Generates a sample configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "hauler.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Hauler configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Put the API credential in your environment:");
                println!("     export HAULER_TOKEN=...");
                println!("  3. Validate: hauler validate-config");
                println!("  4. Run: hauler run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Sample configuration contents
    fn sample_config() -> &'static str {
        r#"# Hauler configuration
# Bulk report export orchestrator

[application]
log_level = "info"
dry_run = false

[api]
base_url = "https://partner.example.com/api/v2"
# Bearer token, substituted from the environment at load time
auth_token = "${HAULER_TOKEN}"
timeout_seconds = 30

[api.retry]
max_retries = 5
initial_delay_ms = 1000
backoff_multiplier = 2.0
max_delay_ms = 30000

[api.rate_limit]
default_wait_secs = 60
max_wait_secs = 300

[api.polling]
initial_delay_ms = 3000
multiplier = 1.2
max_delay_ms = 60000
quick_threshold = 5
quick_delay_ms = 2000
max_attempts = 30

[api.breaker]
failure_threshold = 5
cooldown_seconds = 60

[api.filter]
include = []
exclude = []

[run]
schedule_batch_size = 3
schedule_item_delay_ms = 250
schedule_batch_delay_ms = 2000
progress_save_interval = 10
# Keep a safety buffer below the host's hard kill limit
max_execution_seconds = 300
freshness_hours = 24

[sink]
target = "csv"
output_dir = "./hauler-out"
max_rows_per_page = 50000
batch_write_size = 3000
yield_every_batches = 3

[state]
dir = ".hauler-state"
enabled = true

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
    }
}
