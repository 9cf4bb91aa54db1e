//! Output sink abstraction traits
//!
//! The output sink is an abstract paginated tabular store: pages are
//! identified by name, have a hard row capacity enforced upstream by the
//! chunk planner, and support delete-and-recreate semantics so re-runs
//! are idempotent.

use crate::domain::ids::PageName;
use crate::domain::Result;
use async_trait::async_trait;

/// Paginated tabular output sink
///
/// Implementations must make `replace_page` idempotent: creating a page
/// that already exists drops the old contents first.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Create (or recreate) a page with the given header row.
    ///
    /// Any prior page of the same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the page cannot be created.
    async fn replace_page(&self, name: &PageName, header: &[String]) -> Result<()>;

    /// Append a batch of data rows to an existing page.
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or the write fails.
    async fn append_rows(&self, name: &PageName, rows: &[Vec<String>]) -> Result<()>;

    /// List the pages currently present in the sink
    async fn list_pages(&self) -> Result<Vec<PageName>>;

    /// Delete a page if it exists (missing pages are not an error)
    async fn delete_page(&self, name: &PageName) -> Result<()>;
}
