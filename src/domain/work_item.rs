//! Work item model
//!
//! A work item is one discoverable unit of exportable work, sourced from
//! the remote listing endpoint each run. Immutable once discovered.

use crate::domain::ids::WorkItemId;
use serde::{Deserialize, Serialize};

/// A discoverable unit of exportable work (one remote report)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Remote identifier
    pub id: WorkItemId,

    /// Human-readable name, used to derive output page names
    pub display_name: String,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(id: WorkItemId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Whether this item matches an include/exclude filter entry.
    ///
    /// Filters match either the raw id or the display name, case-insensitive
    /// for names since humans type them.
    pub fn matches_filter(&self, filter: &str) -> bool {
        self.id.as_str() == filter || self.display_name.eq_ignore_ascii_case(filter)
    }
}
