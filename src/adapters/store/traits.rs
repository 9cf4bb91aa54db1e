//! State store abstraction
//!
//! Persisted run state lives behind an explicit key-value interface that
//! is injected into the progress tracker, with no ambient global access.
//! Values are JSON so every key stays independently readable and
//! hand-inspectable.

use crate::domain::Result;
use async_trait::async_trait;

/// Key-value store for persisted run state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails for reasons other than absence.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store `value` under `key`, overwriting any prior value
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Remove the value under `key` (missing keys are not an error)
    async fn delete(&self, key: &str) -> Result<()>;
}
