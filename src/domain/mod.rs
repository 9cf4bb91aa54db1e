//! Core domain types and models
//!
//! This module contains the domain model for Hauler: identifiers, work
//! items, export jobs, result tables, and the error hierarchy.

pub mod errors;
pub mod ids;
pub mod job;
pub mod table;
pub mod work_item;

pub use errors::{ApiError, HaulerError, SinkError};
pub use ids::{ExportJobId, PageName, WorkItemId};
pub use job::{Job, JobStatus};
pub use table::{Chunk, ChunkPlan, ResultTable};
pub use work_item::WorkItem;

/// Result type alias using the domain error
pub type Result<T> = std::result::Result<T, HaulerError>;
