//! Domain error types
//!
//! This module defines the error hierarchy for Hauler. All errors are
//! domain-specific and don't expose third-party types.

use std::time::Duration;
use thiserror::Error;

/// Main Hauler error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum HaulerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Remote export API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Output sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Persisted-state errors
    #[error("State error: {0}")]
    State(String),

    /// A downloaded result payload could not be parsed into a table
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Export-API-specific errors
///
/// Errors that occur when talking to the remote export API. The taxonomy
/// matters: rate limiting is flow control and takes a different path from
/// transport faults, and a circuit-open denial never reaches the network.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The circuit breaker refused the call before any network attempt
    #[error("Circuit breaker is open, call refused")]
    CircuitOpen,

    /// The remote signalled "too many requests" with a suggested wait
    #[error("Rate limited, retry after {wait:?}")]
    RateLimited { wait: Duration },

    /// The server-suggested rate-limit wait exceeds the configured ceiling
    #[error("Rate-limit wait of {wait:?} exceeds the {cap:?} ceiling")]
    RateLimitWaitTooLong { wait: Duration, cap: Duration },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx other than 429)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Transport-level failure (connection refused, DNS, TLS)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Request deadline exceeded at the HTTP layer
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// The response body or headers could not be interpreted
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The remote reported the export job as failed
    #[error("Export job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    /// Status polling exceeded the attempt budget without a terminal state
    #[error("Export job {job_id} still not terminal after {attempts} polls")]
    PollExhausted { job_id: String, attempts: u32 },

    /// The run's wall-clock deadline was crossed while waiting
    #[error("Execution deadline exceeded while waiting on the remote")]
    DeadlineExceeded,
}

impl ApiError {
    /// Whether this error should count toward the circuit breaker threshold.
    ///
    /// Rate-limit responses are flow control, not faults; conflating the two
    /// trips the breaker under normal throttling.
    pub fn is_breaker_fault(&self) -> bool {
        matches!(
            self,
            ApiError::ServerError { .. } | ApiError::Transport(_) | ApiError::Timeout(_)
        )
    }

    /// Whether the resilient call primitive may retry this error.
    pub fn is_retryable(&self) -> bool {
        self.is_breaker_fault()
    }
}

/// Output-sink-specific errors
///
/// Errors that occur when writing pages to the tabular output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A page could not be created or replaced
    #[error("Failed to write page '{page}': {reason}")]
    PageWriteFailed { page: String, reason: String },

    /// Rows were appended to a page that was never created
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Page name rejected by validation
    #[error("Invalid page name: {0}")]
    InvalidPageName(String),

    /// Underlying I/O failure
    #[error("Sink I/O error: {0}")]
    Io(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for HaulerError {
    fn from(err: std::io::Error) -> Self {
        HaulerError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for HaulerError {
    fn from(err: serde_json::Error) -> Self {
        HaulerError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for HaulerError {
    fn from(err: toml::de::Error) -> Self {
        HaulerError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hauler_error_display() {
        let err = HaulerError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_api_error_conversion() {
        let api_err = ApiError::Transport("connection refused".to_string());
        let err: HaulerError = api_err.into();
        assert!(matches!(err, HaulerError::Api(_)));
    }

    #[test]
    fn test_sink_error_conversion() {
        let sink_err = SinkError::PageNotFound("Sales Report".to_string());
        let err: HaulerError = sink_err.into();
        assert!(matches!(err, HaulerError::Sink(_)));
    }

    #[test]
    fn test_rate_limit_is_not_a_breaker_fault() {
        let err = ApiError::RateLimited {
            wait: Duration::from_secs(30),
        };
        assert!(!err.is_breaker_fault());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_errors_are_breaker_faults() {
        let err = ApiError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_breaker_fault());
        assert!(err.is_retryable());

        let err = ApiError::Timeout("30s elapsed".to_string());
        assert!(err.is_breaker_fault());
    }

    #[test]
    fn test_circuit_open_is_not_retryable() {
        assert!(!ApiError::CircuitOpen.is_retryable());
        assert!(!ApiError::CircuitOpen.is_breaker_fault());
    }

    #[test]
    fn test_client_error_is_not_retryable() {
        let err = ApiError::ClientError {
            status: 404,
            message: "not found".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: HaulerError = io_err.into();
        assert!(matches!(err, HaulerError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: HaulerError = json_err.into();
        assert!(matches!(err, HaulerError::Serialization(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = HaulerError::MalformedPayload("zero rows".to_string());
        let _: &dyn std::error::Error = &err;

        let err = ApiError::CircuitOpen;
        let _: &dyn std::error::Error = &err;

        let err = SinkError::Io("disk full".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
