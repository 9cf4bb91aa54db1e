//! Configuration management
//!
//! TOML configuration with environment-variable substitution, `HAULER_*`
//! overrides, and startup validation.

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    ApiConfig, ApplicationConfig, BreakerConfig, FilterConfig, HaulerConfig, LoggingConfig,
    PollingConfig, RateLimitConfig, RetryConfig, RunConfig, SinkConfig, SinkTarget, StateConfig,
};
