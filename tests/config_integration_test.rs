//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with
//! --test-threads=1 to avoid interference between tests.

use hauler::config::{load_config, SinkTarget};
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("HAULER_TEST_TOKEN");
    std::env::remove_var("HAULER_APPLICATION_LOG_LEVEL");
    std::env::remove_var("HAULER_API_BASE_URL");
    std::env::remove_var("HAULER_RUN_MAX_EXECUTION_SECONDS");
    std::env::remove_var("HAULER_SINK_MAX_ROWS_PER_PAGE");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(contents.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "debug"
dry_run = true

[api]
base_url = "https://partner.example.com/api/v2"
username = "exporter"
password = "hunter2"
timeout_seconds = 45

[api.retry]
max_retries = 4
initial_delay_ms = 500
backoff_multiplier = 1.5
max_delay_ms = 20000

[api.rate_limit]
default_wait_secs = 30
max_wait_secs = 120

[api.polling]
initial_delay_ms = 2000
multiplier = 1.3
max_delay_ms = 45000
quick_threshold = 4
quick_delay_ms = 1500
max_attempts = 25

[api.breaker]
failure_threshold = 3
cooldown_seconds = 90

[api.filter]
include = ["Weekly Sales"]
exclude = ["Scratch"]

[run]
schedule_batch_size = 5
schedule_item_delay_ms = 100
schedule_batch_delay_ms = 1000
progress_save_interval = 20
max_execution_seconds = 240
freshness_hours = 12

[sink]
target = "csv"
output_dir = "/tmp/hauler-out"
max_rows_per_page = 10000
batch_write_size = 2000
yield_every_batches = 2

[state]
dir = "/tmp/hauler-state"
enabled = true

[logging]
local_enabled = false
local_path = "/tmp/hauler-logs"
local_rotation = "hourly"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);

    assert_eq!(config.api.base_url, "https://partner.example.com/api/v2");
    assert_eq!(config.api.username, Some("exporter".to_string()));
    assert_eq!(config.api.timeout_seconds, 45);
    assert_eq!(config.api.retry.max_retries, 4);
    assert_eq!(config.api.retry.backoff_multiplier, 1.5);
    assert_eq!(config.api.rate_limit.max_wait_secs, 120);
    assert_eq!(config.api.polling.quick_threshold, 4);
    assert_eq!(config.api.polling.max_attempts, 25);
    assert_eq!(config.api.breaker.failure_threshold, 3);
    assert_eq!(config.api.filter.include, vec!["Weekly Sales"]);

    assert_eq!(config.run.schedule_batch_size, 5);
    assert_eq!(config.run.max_execution_seconds, 240);
    assert_eq!(config.run.freshness_hours, 12);

    assert_eq!(config.sink.target, SinkTarget::Csv);
    assert_eq!(config.sink.max_rows_per_page, 10000);
    assert_eq!(config.sink.batch_write_size, 2000);

    assert!(config.state.enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_env_var_substitution_in_config() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("HAULER_TEST_TOKEN", "sekrit-token");

    let toml_content = r#"
[api]
base_url = "https://partner.example.com/api/v2"
auth_token = "${HAULER_TEST_TOKEN}"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    use secrecy::ExposeSecret;
    assert_eq!(
        config.api.auth_token.unwrap().expose_secret(),
        "sekrit-token"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_fails_loading() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[api]
base_url = "https://partner.example.com/api/v2"
auth_token = "${HAULER_TEST_TOKEN}"
"#;

    let temp_file = write_config(toml_content);
    let result = load_config(temp_file.path());
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("HAULER_TEST_TOKEN"));
}

#[test]
fn test_env_overrides_take_precedence() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("HAULER_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("HAULER_RUN_MAX_EXECUTION_SECONDS", "120");
    std::env::set_var("HAULER_SINK_MAX_ROWS_PER_PAGE", "2500");

    let toml_content = r#"
[application]
log_level = "info"

[api]
base_url = "https://partner.example.com/api/v2"

[run]
max_execution_seconds = 300
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.run.max_execution_seconds, 120);
    assert_eq!(config.sink.max_rows_per_page, 2500);

    cleanup_env_vars();
}

#[test]
fn test_invalid_values_fail_at_load_time() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[api]
base_url = "https://partner.example.com/api/v2"

[api.polling]
multiplier = 0.5
"#;

    let temp_file = write_config(toml_content);
    let result = load_config(temp_file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("multiplier"));
}

#[test]
fn test_missing_api_section_fails() {
    let _guard = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    assert!(load_config(temp_file.path()).is_err());
}
