//! Export API adapter

pub mod backoff;
pub mod client;
pub mod models;

pub use backoff::{PollSchedule, RetrySchedule};
pub use client::ExportApiClient;
pub use models::{ExportParams, JobStatusResponse, StatusKind, WorkItemRecord};
