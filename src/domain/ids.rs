//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers that cross the API and sink
//! boundaries. Each type ensures type safety and validates its format on
//! construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Work item identifier newtype wrapper
///
/// Identifies one discoverable unit of exportable work (one remote report
/// template). Opaque to us; the remote system defines the format.
///
/// # Examples
///
/// ```
/// use hauler::domain::ids::WorkItemId;
/// use std::str::FromStr;
///
/// let id = WorkItemId::from_str("rpt-20871").unwrap();
/// assert_eq!(id.as_str(), "rpt-20871");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(String);

impl WorkItemId {
    /// Creates a new WorkItemId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Work item ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for WorkItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Export job identifier newtype wrapper
///
/// The opaque handle the remote system issues when an export job is
/// scheduled, usually the last path segment of a `Location` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportJobId(String);

impl ExportJobId {
    /// Creates a new ExportJobId from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or whitespace-only.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Export job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ExportJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExportJobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ExportJobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maximum accepted page-name length. Spreadsheet-style sinks reject
/// longer names, so we cap at construction rather than at write time.
const MAX_PAGE_NAME_LEN: usize = 100;

/// Output page name newtype wrapper
///
/// Identifies one page (tab/sheet/file) in the tabular output sink.
/// Sanitized on construction: characters the common sinks reject are
/// replaced with spaces, and the result is length-capped.
///
/// # Examples
///
/// ```
/// use hauler::domain::ids::PageName;
///
/// let name = PageName::new("Weekly Sales").unwrap();
/// assert_eq!(name.as_str(), "Weekly Sales");
///
/// let part = name.with_part(2);
/// assert_eq!(part.as_str(), "Weekly Sales (part 2)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageName(String);

impl PageName {
    /// Creates a new PageName, sanitizing sink-hostile characters
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let raw = name.into();
        let sanitized: String = raw
            .chars()
            .map(|c| match c {
                '/' | '\\' | '?' | '*' | '[' | ']' | ':' => ' ',
                _ => c,
            })
            .collect();
        let trimmed = sanitized.trim();
        if trimmed.is_empty() {
            return Err("Page name cannot be empty".to_string());
        }

        let capped: String = trimmed.chars().take(MAX_PAGE_NAME_LEN).collect();
        Ok(Self(capped.trim_end().to_string()))
    }

    /// Derives the name of the Nth chunk page (1-based ordinal)
    pub fn with_part(&self, part: usize) -> PageName {
        let suffix = format!(" (part {part})");
        let budget = MAX_PAGE_NAME_LEN.saturating_sub(suffix.chars().count());
        let base: String = self.0.chars().take(budget).collect();
        PageName(format!("{}{}", base.trim_end(), suffix))
    }

    /// Returns the page name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PageName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
