//! CSV directory sink
//!
//! Materializes each page as one CSV file under an output directory.
//! Replacing a page truncates its file, which gives the delete-and-
//! recreate semantics the writer relies on for idempotent re-runs.

use crate::domain::ids::PageName;
use crate::domain::{Result, SinkError};
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use super::traits::PageSink;

/// CSV-file implementation of [`PageSink`]
#[derive(Debug)]
pub struct CsvDirectorySink {
    dir: PathBuf,
}

impl CsvDirectorySink {
    /// Create a sink rooted at `dir`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| SinkError::Io(format!(
            "Failed to create output directory {}: {e}",
            dir.display()
        )))?;
        Ok(Self { dir })
    }

    fn page_path(&self, name: &PageName) -> PathBuf {
        self.dir.join(format!("{}.csv", name.as_str()))
    }

    fn write_failed(name: &PageName, e: impl std::fmt::Display) -> SinkError {
        SinkError::PageWriteFailed {
            page: name.as_str().to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl PageSink for CsvDirectorySink {
    async fn replace_page(&self, name: &PageName, header: &[String]) -> Result<()> {
        let path = self.page_path(name);
        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| Self::write_failed(name, e))?;
        writer
            .write_record(header)
            .map_err(|e| Self::write_failed(name, e))?;
        writer.flush().map_err(|e| Self::write_failed(name, e))?;

        tracing::debug!(page = %name, path = %path.display(), "Replaced page");
        Ok(())
    }

    async fn append_rows(&self, name: &PageName, rows: &[Vec<String>]) -> Result<()> {
        let path = self.page_path(name);
        if !path.exists() {
            return Err(SinkError::PageNotFound(name.as_str().to_string()).into());
        }

        let file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| Self::write_failed(name, e))?;
        let mut writer = csv::Writer::from_writer(file);
        for row in rows {
            writer
                .write_record(row)
                .map_err(|e| Self::write_failed(name, e))?;
        }
        writer.flush().map_err(|e| Self::write_failed(name, e))?;
        Ok(())
    }

    async fn list_pages(&self) -> Result<Vec<PageName>> {
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| SinkError::Io(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| SinkError::Io(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if let Ok(name) = PageName::new(stem) {
                        names.push(name);
                    }
                }
            }
        }
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(names)
    }

    async fn delete_page(&self, name: &PageName) -> Result<()> {
        let path = self.page_path(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| Self::write_failed(name, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn name(s: &str) -> PageName {
        PageName::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_replace_then_append_round_trip() {
        let dir = TempDir::new().unwrap();
        let sink = CsvDirectorySink::new(dir.path()).unwrap();
        let page = name("Weekly Sales");

        sink.replace_page(&page, &["id".to_string(), "amount".to_string()])
            .await
            .unwrap();
        sink.append_rows(
            &page,
            &[
                vec!["1".to_string(), "10.00".to_string()],
                vec!["2".to_string(), "20.00".to_string()],
            ],
        )
        .await
        .unwrap();

        let contents = fs::read_to_string(dir.path().join("Weekly Sales.csv")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["id,amount", "1,10.00", "2,20.00"]);
    }

    #[tokio::test]
    async fn test_replace_truncates_existing_page() {
        let dir = TempDir::new().unwrap();
        let sink = CsvDirectorySink::new(dir.path()).unwrap();
        let page = name("Sales");

        sink.replace_page(&page, &["id".to_string()]).await.unwrap();
        sink.append_rows(&page, &[vec!["1".to_string()]]).await.unwrap();
        sink.replace_page(&page, &["id".to_string()]).await.unwrap();

        let contents = fs::read_to_string(dir.path().join("Sales.csv")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_append_to_missing_page_fails() {
        let dir = TempDir::new().unwrap();
        let sink = CsvDirectorySink::new(dir.path()).unwrap();
        let result = sink
            .append_rows(&name("Missing"), &[vec!["1".to_string()]])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let dir = TempDir::new().unwrap();
        let sink = CsvDirectorySink::new(dir.path()).unwrap();
        sink.replace_page(&name("B Report"), &["x".to_string()])
            .await
            .unwrap();
        sink.replace_page(&name("A Report"), &["x".to_string()])
            .await
            .unwrap();

        let pages = sink.list_pages().await.unwrap();
        let names: Vec<&str> = pages.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["A Report", "B Report"]);
    }
}
