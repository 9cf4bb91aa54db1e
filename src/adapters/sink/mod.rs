//! Output sink adapters

pub mod csv;
pub mod factory;
pub mod memory;
pub mod traits;

pub use csv::CsvDirectorySink;
pub use factory::create_sink;
pub use memory::{MemoryPage, MemorySink};
pub use traits::PageSink;
