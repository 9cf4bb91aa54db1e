//! Sink factory
//!
//! Creates the configured [`PageSink`] implementation. Dry-run mode
//! always gets the in-memory sink regardless of the configured target.

use crate::config::{SinkConfig, SinkTarget};
use crate::domain::Result;
use std::sync::Arc;

use super::csv::CsvDirectorySink;
use super::memory::MemorySink;
use super::traits::PageSink;

/// Create a page sink from configuration
///
/// # Errors
///
/// Returns an error if the CSV sink's output directory cannot be created.
pub fn create_sink(config: &SinkConfig, dry_run: bool) -> Result<Arc<dyn PageSink>> {
    if dry_run {
        tracing::info!("Dry run: using in-memory sink");
        return Ok(Arc::new(MemorySink::new()));
    }

    match config.target {
        SinkTarget::Memory => Ok(Arc::new(MemorySink::new())),
        SinkTarget::Csv => {
            let sink = CsvDirectorySink::new(&config.output_dir)?;
            tracing::info!(output_dir = %config.output_dir, "Using CSV directory sink");
            Ok(Arc::new(sink))
        }
    }
}
