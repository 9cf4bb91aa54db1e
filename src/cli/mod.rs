//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Hauler using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Hauler - bulk report export orchestrator
#[derive(Parser, Debug)]
#[command(name = "hauler")]
#[command(version, about, long_about = None)]
#[command(author = "Hauler Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hauler.toml", env = "HAULER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HAULER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull report exports from the partner API into the output sink
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show checkpoint, last run summary, and completed ledger
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Remove all persisted run state
    ClearState(commands::clear::ClearArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["hauler", "run"]);
        assert_eq!(cli.config, "hauler.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["hauler", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["hauler", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_run_flags() {
        let cli = Cli::parse_from(["hauler", "run", "--resume", "--yes", "--max-minutes", "10"]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.resume);
                assert!(args.yes);
                assert_eq!(args.max_minutes, Some(10));
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["hauler", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["hauler", "status"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["hauler", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_parse_clear_state() {
        let cli = Cli::parse_from(["hauler", "clear-state", "--yes"]);
        assert!(matches!(cli.command, Commands::ClearState(_)));
    }
}
