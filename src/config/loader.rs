//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::HaulerConfig;
use crate::domain::errors::HaulerError;
use crate::domain::Result;
use regex::Regex;
use secrecy::SecretString;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into HaulerConfig
/// 4. Applies environment variable overrides (HAULER_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use hauler::config::load_config;
///
/// let config = load_config("hauler.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<HaulerConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HaulerError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HaulerError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: HaulerConfig = toml::from_str(&contents)
        .map_err(|e| HaulerError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        HaulerError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    // Process line by line so placeholders inside comments stay untouched
    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(HaulerError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the HAULER_* prefix
///
/// Environment variables follow the pattern: HAULER_<SECTION>_<KEY>,
/// e.g. HAULER_API_BASE_URL, HAULER_RUN_MAX_EXECUTION_SECONDS.
fn apply_env_overrides(config: &mut HaulerConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("HAULER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("HAULER_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // API overrides
    if let Ok(val) = std::env::var("HAULER_API_BASE_URL") {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("HAULER_API_AUTH_TOKEN") {
        config.api.auth_token = Some(SecretString::new(val));
    }
    if let Ok(val) = std::env::var("HAULER_API_USERNAME") {
        config.api.username = Some(val);
    }
    if let Ok(val) = std::env::var("HAULER_API_PASSWORD") {
        config.api.password = Some(SecretString::new(val));
    }
    if let Ok(val) = std::env::var("HAULER_API_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.api.timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("HAULER_API_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.api.retry.max_retries = retries;
        }
    }
    if let Ok(val) = std::env::var("HAULER_API_RATE_LIMIT_MAX_WAIT_SECS") {
        if let Ok(secs) = val.parse() {
            config.api.rate_limit.max_wait_secs = secs;
        }
    }

    // Run overrides
    if let Ok(val) = std::env::var("HAULER_RUN_MAX_EXECUTION_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.run.max_execution_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("HAULER_RUN_SCHEDULE_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.run.schedule_batch_size = size;
        }
    }
    if let Ok(val) = std::env::var("HAULER_RUN_FRESHNESS_HOURS") {
        if let Ok(hours) = val.parse() {
            config.run.freshness_hours = hours;
        }
    }

    // Sink overrides
    if let Ok(val) = std::env::var("HAULER_SINK_OUTPUT_DIR") {
        config.sink.output_dir = val;
    }
    if let Ok(val) = std::env::var("HAULER_SINK_MAX_ROWS_PER_PAGE") {
        if let Ok(rows) = val.parse() {
            config.sink.max_rows_per_page = rows;
        }
    }

    // State overrides
    if let Ok(val) = std::env::var("HAULER_STATE_DIR") {
        config.state.dir = val;
    }
    if let Ok(val) = std::env::var("HAULER_STATE_ENABLED") {
        config.state.enabled = val.parse().unwrap_or(true);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("HAULER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("HAULER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("HAULER_TEST_VAR", "test_value");
        let input = "auth_token = \"${HAULER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "auth_token = \"test_value\"\n");
        std::env::remove_var("HAULER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("HAULER_MISSING_VAR");
        let input = "auth_token = \"${HAULER_MISSING_VAR}\"";
        let result = substitute_env_vars(input);
        assert!(result.is_err());
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# uses ${HAULER_NOT_SET_ANYWHERE}\nvalue = 1";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${HAULER_NOT_SET_ANYWHERE}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "info"

[api]
base_url = "https://partner.example.com/api/v2"

[run]
schedule_batch_size = 2

[sink]
max_rows_per_page = 1000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config.api.base_url, "https://partner.example.com/api/v2");
        assert_eq!(config.run.schedule_batch_size, 2);
        assert_eq!(config.sink.max_rows_per_page, 1000);
    }

    #[test]
    fn test_load_config_invalid_values_fail_validation() {
        let toml_content = r#"
[api]
base_url = "https://partner.example.com/api/v2"

[sink]
max_rows_per_page = 0
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
