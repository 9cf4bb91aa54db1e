//! State store factory

use crate::config::StateConfig;
use crate::domain::Result;
use std::sync::Arc;

use super::file::JsonFileStore;
use super::memory::MemoryStateStore;
use super::traits::StateStore;

/// Create a state store from configuration.
///
/// Disabled state gets an in-memory store: the run works normally but
/// nothing survives the process, so every run is a fresh run.
///
/// # Errors
///
/// Returns an error if the state directory cannot be created.
pub fn create_store(config: &StateConfig) -> Result<Arc<dyn StateStore>> {
    if !config.enabled {
        tracing::info!("State persistence disabled, using in-memory store");
        return Ok(Arc::new(MemoryStateStore::new()));
    }

    let store = JsonFileStore::new(&config.dir)?;
    tracing::debug!(dir = %config.dir, "Using JSON file state store");
    Ok(Arc::new(store))
}
