//! Business logic
//!
//! Core orchestration: circuit breaking, payload processing, batched
//! page writing, run-state persistence, and the run coordinator.

pub mod breaker;
pub mod process;
pub mod run;
pub mod state;
pub mod write;
