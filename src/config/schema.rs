//! Configuration schema types
//!
//! This module defines the configuration structure for Hauler. Every knob
//! has a documented default and is validated at startup; invalid values
//! fail loading, not first use.

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Main Hauler configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct HaulerConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Remote export API configuration
    pub api: ApiConfig,

    /// Run/orchestration settings
    #[serde(default)]
    pub run: RunConfig,

    /// Output sink configuration
    #[serde(default)]
    pub sink: SinkConfig,

    /// Persisted-state configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HaulerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.api.validate()?;
        self.run.validate()?;
        self.sink.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode: parse and plan but write to an in-memory sink
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Remote export API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the export API
    pub base_url: String,

    /// Bearer token (preferred when present)
    #[serde(default)]
    pub auth_token: Option<SecretString>,

    /// Basic-auth username (used when no bearer token is configured)
    #[serde(default)]
    pub username: Option<String>,

    /// Basic-auth password
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry/backoff policy for transport and 5xx failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Rate-limit handling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Job-status polling cadence
    #[serde(default)]
    pub polling: PollingConfig,

    /// Circuit breaker thresholds
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Client-side work-item filtering
    #[serde(default)]
    pub filter: FilterConfig,
}

impl ApiConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("api.base_url must not be empty".to_string());
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!("api.base_url is not a valid URL: {}", self.base_url));
        }
        if self.timeout_seconds == 0 {
            return Err("api.timeout_seconds must be greater than zero".to_string());
        }
        self.retry.validate()?;
        self.rate_limit.validate()?;
        self.polling.validate()?;
        self.breaker.validate()?;
        Ok(())
    }
}

/// Retry configuration for transport/5xx failures
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts before the error propagates
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Backoff multiplier applied per attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Delay ceiling in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("api.retry.max_retries must be at least 1".to_string());
        }
        if self.initial_delay_ms == 0 {
            return Err("api.retry.initial_delay_ms must be greater than zero".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("api.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err("api.retry.max_delay_ms must be >= initial_delay_ms".to_string());
        }
        Ok(())
    }
}

/// Rate-limit handling configuration
///
/// A 429 is flow control, not a fault: the client sleeps the
/// server-suggested duration and retries without touching the circuit
/// breaker. The wait ceiling keeps one heavily throttled call from
/// silently consuming the whole execution budget.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Wait applied when the server sends no Retry-After header, in seconds
    #[serde(default = "default_rate_limit_wait_secs")]
    pub default_wait_secs: u64,

    /// Ceiling on the accepted server-suggested wait, in seconds
    #[serde(default = "default_max_rate_limit_wait_secs")]
    pub max_wait_secs: u64,

    /// Consecutive honoured waits on one call before giving up
    #[serde(default = "default_max_consecutive_waits")]
    pub max_consecutive_waits: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_wait_secs: default_rate_limit_wait_secs(),
            max_wait_secs: default_max_rate_limit_wait_secs(),
            max_consecutive_waits: default_max_consecutive_waits(),
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_wait_secs == 0 {
            return Err("api.rate_limit.max_wait_secs must be greater than zero".to_string());
        }
        if self.default_wait_secs > self.max_wait_secs {
            return Err("api.rate_limit.default_wait_secs must not exceed max_wait_secs".to_string());
        }
        if self.max_consecutive_waits == 0 {
            return Err("api.rate_limit.max_consecutive_waits must be at least 1".to_string());
        }
        Ok(())
    }

    /// Default wait as a Duration
    pub fn default_wait(&self) -> Duration {
        Duration::from_secs(self.default_wait_secs)
    }

    /// Wait ceiling as a Duration
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

/// Job-status polling cadence
///
/// Delays grow geometrically for the first `quick_threshold` attempts,
/// then drop to a short constant delay: early polls back off to avoid
/// hammering fresh jobs, while long-running jobs are checked frequently
/// once they have proven slow.
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    /// First poll delay in milliseconds
    #[serde(default = "default_poll_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied per attempt during the backoff window
    #[serde(default = "default_poll_multiplier")]
    pub multiplier: f64,

    /// Delay ceiling during the backoff window, in milliseconds
    #[serde(default = "default_poll_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Number of attempts using geometric backoff before switching
    #[serde(default = "default_poll_quick_threshold")]
    pub quick_threshold: u32,

    /// Constant delay after the backoff window, in milliseconds
    #[serde(default = "default_poll_quick_delay_ms")]
    pub quick_delay_ms: u64,

    /// Hard cap on poll attempts per job
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_poll_initial_delay_ms(),
            multiplier: default_poll_multiplier(),
            max_delay_ms: default_poll_max_delay_ms(),
            quick_threshold: default_poll_quick_threshold(),
            quick_delay_ms: default_poll_quick_delay_ms(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

impl PollingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.initial_delay_ms == 0 {
            return Err("api.polling.initial_delay_ms must be greater than zero".to_string());
        }
        if self.multiplier < 1.0 {
            return Err("api.polling.multiplier must be >= 1.0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("api.polling.max_attempts must be at least 1".to_string());
        }
        if self.quick_delay_ms == 0 {
            return Err("api.polling.quick_delay_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive counted failures before the breaker opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Cooldown before a half-open trial call, in seconds
    #[serde(default = "default_breaker_cooldown_seconds")]
    pub cooldown_seconds: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_seconds: default_breaker_cooldown_seconds(),
        }
    }
}

impl BreakerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("api.breaker.failure_threshold must be at least 1".to_string());
        }
        if self.cooldown_seconds == 0 {
            return Err("api.breaker.cooldown_seconds must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Cooldown as a Duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

/// Client-side include/exclude filtering of discovered work items
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    /// When non-empty, only items matching an entry (by id or name) are kept
    #[serde(default)]
    pub include: Vec<String>,

    /// Items matching an entry (by id or name) are dropped
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Run/orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Items scheduled per pacing batch
    #[serde(default = "default_schedule_batch_size")]
    pub schedule_batch_size: usize,

    /// Delay between schedule calls within a batch, in milliseconds
    #[serde(default = "default_schedule_item_delay_ms")]
    pub schedule_item_delay_ms: u64,

    /// Delay between pacing batches, in milliseconds
    #[serde(default = "default_schedule_batch_delay_ms")]
    pub schedule_batch_delay_ms: u64,

    /// Checkpoint every N scheduled/processed items
    #[serde(default = "default_progress_save_interval")]
    pub progress_save_interval: usize,

    /// Wall-clock execution budget in seconds.
    ///
    /// Set with a safety buffer below the host's hard kill limit so a
    /// timeout can still reach a checkpoint save.
    #[serde(default = "default_max_execution_seconds")]
    pub max_execution_seconds: u64,

    /// Completed items younger than this are skipped on later runs, in hours
    #[serde(default = "default_freshness_hours")]
    pub freshness_hours: u64,

    /// Optional export window start (RFC3339), passed through to the API
    #[serde(default)]
    pub date_from: Option<String>,

    /// Optional export window end (RFC3339), passed through to the API
    #[serde(default)]
    pub date_to: Option<String>,

    /// Optional remote-side status filter, passed through to the API
    #[serde(default)]
    pub status_filter: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schedule_batch_size: default_schedule_batch_size(),
            schedule_item_delay_ms: default_schedule_item_delay_ms(),
            schedule_batch_delay_ms: default_schedule_batch_delay_ms(),
            progress_save_interval: default_progress_save_interval(),
            max_execution_seconds: default_max_execution_seconds(),
            freshness_hours: default_freshness_hours(),
            date_from: None,
            date_to: None,
            status_filter: None,
        }
    }
}

impl RunConfig {
    fn validate(&self) -> Result<(), String> {
        if self.schedule_batch_size == 0 {
            return Err("run.schedule_batch_size must be at least 1".to_string());
        }
        if self.progress_save_interval == 0 {
            return Err("run.progress_save_interval must be at least 1".to_string());
        }
        if self.max_execution_seconds == 0 {
            return Err("run.max_execution_seconds must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Execution budget as a Duration
    pub fn max_execution(&self) -> Duration {
        Duration::from_secs(self.max_execution_seconds)
    }

    /// Freshness threshold as a chrono Duration
    pub fn freshness_threshold(&self) -> chrono::Duration {
        chrono::Duration::hours(self.freshness_hours as i64)
    }
}

/// Output sink target selection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SinkTarget {
    /// One CSV file per page under `output_dir`
    #[default]
    Csv,
    /// In-memory pages (dry runs and tests)
    Memory,
}

/// Output sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Sink implementation to use
    #[serde(default)]
    pub target: SinkTarget,

    /// Directory for the CSV sink
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Hard per-page row capacity (header excluded)
    #[serde(default = "default_max_rows_per_page")]
    pub max_rows_per_page: usize,

    /// Maximum rows per write batch
    #[serde(default = "default_batch_write_size")]
    pub batch_write_size: usize,

    /// Cooperative yield every N batches
    #[serde(default = "default_yield_every_batches")]
    pub yield_every_batches: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            target: SinkTarget::default(),
            output_dir: default_output_dir(),
            max_rows_per_page: default_max_rows_per_page(),
            batch_write_size: default_batch_write_size(),
            yield_every_batches: default_yield_every_batches(),
        }
    }
}

impl SinkConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_rows_per_page == 0 {
            return Err("sink.max_rows_per_page must be greater than zero".to_string());
        }
        if self.batch_write_size == 0 {
            return Err("sink.batch_write_size must be greater than zero".to_string());
        }
        if self.yield_every_batches == 0 {
            return Err("sink.yield_every_batches must be at least 1".to_string());
        }
        if self.target == SinkTarget::Csv && self.output_dir.trim().is_empty() {
            return Err("sink.output_dir must not be empty for the csv sink".to_string());
        }
        Ok(())
    }
}

/// Persisted-state configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StateConfig {
    /// Directory holding the JSON state files
    #[serde(default = "default_state_dir")]
    pub dir: String,

    /// Disable to run without checkpoints or a ledger (every run is full)
    #[serde(default = "default_state_enabled")]
    pub enabled: bool,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            enabled: default_state_enabled(),
        }
    }
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.dir.trim().is_empty() {
            return Err("state.dir must not be empty when state is enabled".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Enable rotating JSON file logs in addition to console output
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily or hourly
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path must not be empty when file logging is enabled"
                .to_string());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_rate_limit_wait_secs() -> u64 {
    60
}

fn default_max_rate_limit_wait_secs() -> u64 {
    300
}

fn default_max_consecutive_waits() -> u32 {
    10
}

fn default_poll_initial_delay_ms() -> u64 {
    3000
}

fn default_poll_multiplier() -> f64 {
    1.2
}

fn default_poll_max_delay_ms() -> u64 {
    60_000
}

fn default_poll_quick_threshold() -> u32 {
    5
}

fn default_poll_quick_delay_ms() -> u64 {
    2000
}

fn default_poll_max_attempts() -> u32 {
    30
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_breaker_cooldown_seconds() -> u64 {
    60
}

fn default_schedule_batch_size() -> usize {
    3
}

fn default_schedule_item_delay_ms() -> u64 {
    250
}

fn default_schedule_batch_delay_ms() -> u64 {
    2000
}

fn default_progress_save_interval() -> usize {
    10
}

fn default_max_execution_seconds() -> u64 {
    300
}

fn default_freshness_hours() -> u64 {
    24
}

fn default_output_dir() -> String {
    "./hauler-out".to_string()
}

fn default_max_rows_per_page() -> usize {
    50_000
}

fn default_batch_write_size() -> usize {
    3000
}

fn default_yield_every_batches() -> usize {
    3
}

fn default_state_dir() -> String {
    ".hauler-state".to_string()
}

fn default_state_enabled() -> bool {
    true
}

fn default_log_path() -> String {
    "./logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
