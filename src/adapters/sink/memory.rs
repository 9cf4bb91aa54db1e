//! In-memory page sink
//!
//! Holds pages in a map behind a mutex. Used for dry runs and by the
//! test suite; mirrors the CSV sink's semantics exactly.

use crate::domain::ids::PageName;
use crate::domain::{Result, SinkError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::traits::PageSink;

/// One stored page
#[derive(Debug, Clone, Default)]
pub struct MemoryPage {
    /// Header row
    pub header: Vec<String>,
    /// Data rows in append order
    pub rows: Vec<Vec<String>>,
}

/// In-memory implementation of [`PageSink`]
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Mutex<BTreeMap<String, MemoryPage>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot one page for assertions
    pub fn page(&self, name: &str) -> Option<MemoryPage> {
        self.pages.lock().unwrap().get(name).cloned()
    }

    /// Number of pages currently stored
    pub fn page_count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSink for MemorySink {
    async fn replace_page(&self, name: &PageName, header: &[String]) -> Result<()> {
        let mut pages = self.pages.lock().unwrap();
        pages.insert(
            name.as_str().to_string(),
            MemoryPage {
                header: header.to_vec(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    async fn append_rows(&self, name: &PageName, rows: &[Vec<String>]) -> Result<()> {
        let mut pages = self.pages.lock().unwrap();
        let page = pages
            .get_mut(name.as_str())
            .ok_or_else(|| SinkError::PageNotFound(name.as_str().to_string()))?;
        page.rows.extend(rows.iter().cloned());
        Ok(())
    }

    async fn list_pages(&self) -> Result<Vec<PageName>> {
        let pages = self.pages.lock().unwrap();
        let names = pages
            .keys()
            .filter_map(|k| PageName::new(k.clone()).ok())
            .collect();
        Ok(names)
    }

    async fn delete_page(&self, name: &PageName) -> Result<()> {
        self.pages.lock().unwrap().remove(name.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> PageName {
        PageName::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_replace_and_append() {
        let sink = MemorySink::new();
        let page = name("Sales");
        sink.replace_page(&page, &["id".to_string()]).await.unwrap();
        sink.append_rows(&page, &[vec!["1".to_string()], vec!["2".to_string()]])
            .await
            .unwrap();

        let stored = sink.page("Sales").unwrap();
        assert_eq!(stored.header, vec!["id"]);
        assert_eq!(stored.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_drops_prior_contents() {
        let sink = MemorySink::new();
        let page = name("Sales");
        sink.replace_page(&page, &["id".to_string()]).await.unwrap();
        sink.append_rows(&page, &[vec!["1".to_string()]]).await.unwrap();

        sink.replace_page(&page, &["id".to_string()]).await.unwrap();
        let stored = sink.page("Sales").unwrap();
        assert!(stored.rows.is_empty());
    }

    #[tokio::test]
    async fn test_append_to_missing_page_fails() {
        let sink = MemorySink::new();
        let result = sink
            .append_rows(&name("Nope"), &[vec!["1".to_string()]])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_page_is_ok() {
        let sink = MemorySink::new();
        assert!(sink.delete_page(&name("Nope")).await.is_ok());
    }
}
