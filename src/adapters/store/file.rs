//! JSON-file state store
//!
//! Persists each key as `<dir>/<key>.json`. Writes go through a
//! temporary file followed by an atomic rename so a crash mid-write can
//! never leave a truncated state file behind.

use crate::domain::{HaulerError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use super::traits::StateStore;

/// File-backed implementation of [`StateStore`]
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            HaulerError::State(format!(
                "Failed to create state directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| HaulerError::State(format!("Failed to read {}: {e}", path.display())))?;
        let value = serde_json::from_str(&contents).map_err(|e| {
            HaulerError::State(format!("Corrupt state file {}: {e}", path.display()))
        })?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));

        let contents = serde_json::to_string_pretty(&value)?;
        fs::write(&tmp, contents)
            .map_err(|e| HaulerError::State(format!("Failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path).map_err(|e| {
            HaulerError::State(format!(
                "Failed to move state file into place at {}: {e}",
                path.display()
            ))
        })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                HaulerError::State(format!("Failed to delete {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }
}
