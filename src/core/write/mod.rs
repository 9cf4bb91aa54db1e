//! Batched page writing
//!
//! Writes result tables into the page sink, splitting oversized tables
//! across chunk pages and bounding every single write's resource cost
//! with a batch size. A cooperative yield is inserted between batch
//! groups so long writes never starve the scheduler.

use crate::adapters::sink::PageSink;
use crate::config::SinkConfig;
use crate::domain::ids::PageName;
use crate::domain::{ChunkPlan, Result, ResultTable, WorkItem};
use std::sync::Arc;

/// Outcome of writing one work item's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    /// Pages written, in order
    pub pages: Vec<PageName>,

    /// Total data rows written
    pub total_rows: usize,

    /// Whether the result was split across chunk pages
    pub chunked: bool,
}

/// Writes row batches into one or more bounded-size output pages
pub struct OutputWriter {
    sink: Arc<dyn PageSink>,
    batch_write_size: usize,
    yield_every_batches: usize,
}

impl OutputWriter {
    /// Create a writer over a sink
    pub fn new(sink: Arc<dyn PageSink>, config: &SinkConfig) -> Self {
        Self {
            sink,
            batch_write_size: config.batch_write_size,
            yield_every_batches: config.yield_every_batches,
        }
    }

    /// The underlying sink
    pub fn sink(&self) -> &Arc<dyn PageSink> {
        &self.sink
    }

    /// Write one work item's result.
    ///
    /// Without a chunk plan the whole table lands on a single page named
    /// for the work item. With a plan, each chunk gets its own ordinal
    /// page carrying a duplicated header, written strictly in row order.
    /// Page creation replaces any prior page of the same name, so re-runs
    /// are idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be created or a batch write
    /// fails. Pages already written stay in place.
    pub async fn write(
        &self,
        work_item: &WorkItem,
        table: &ResultTable,
        plan: Option<&ChunkPlan>,
    ) -> Result<WriteReport> {
        let base_name = PageName::new(&work_item.display_name)
            .map_err(crate::domain::SinkError::InvalidPageName)?;

        let mut pages = Vec::new();

        match plan {
            None => {
                self.write_page(&base_name, &table.header, &table.rows).await?;
                pages.push(base_name);
            }
            Some(plan) => {
                for chunk in &plan.chunks {
                    let page_name = base_name.with_part(chunk.ordinal);
                    let rows = &table.rows[chunk.start..chunk.end];
                    self.write_page(&page_name, &table.header, rows).await?;
                    pages.push(page_name);
                }
            }
        }

        let report = WriteReport {
            pages,
            total_rows: table.row_count(),
            chunked: plan.is_some(),
        };

        tracing::info!(
            work_item_id = %work_item.id,
            pages = report.pages.len(),
            rows = report.total_rows,
            chunked = report.chunked,
            "Wrote result"
        );

        Ok(report)
    }

    /// Replace one page and stream its rows in bounded batches
    async fn write_page(
        &self,
        name: &PageName,
        header: &[String],
        rows: &[Vec<String>],
    ) -> Result<()> {
        self.sink.replace_page(name, header).await?;

        let mut batches_written = 0usize;
        for batch in rows.chunks(self.batch_write_size.max(1)) {
            self.sink.append_rows(name, batch).await?;
            batches_written += 1;
            if batches_written % self.yield_every_batches == 0 {
                tokio::task::yield_now().await;
            }
        }

        tracing::debug!(
            page = %name,
            rows = rows.len(),
            batches = batches_written,
            "Page written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sink::MemorySink;
    use crate::domain::ids::WorkItemId;
    use std::str::FromStr;

    fn writer_with(batch: usize) -> (Arc<MemorySink>, OutputWriter) {
        let sink = Arc::new(MemorySink::new());
        let config = SinkConfig {
            batch_write_size: batch,
            ..SinkConfig::default()
        };
        let writer = OutputWriter::new(sink.clone(), &config);
        (sink, writer)
    }

    fn item() -> WorkItem {
        WorkItem::new(WorkItemId::from_str("rpt-1").unwrap(), "Weekly Sales")
    }

    fn table(rows: usize) -> ResultTable {
        ResultTable::new(
            vec!["id".to_string()],
            (0..rows).map(|i| vec![i.to_string()]).collect(),
        )
    }

    #[tokio::test]
    async fn test_single_page_write() {
        let (sink, writer) = writer_with(3000);
        let report = writer.write(&item(), &table(10), None).await.unwrap();

        assert!(!report.chunked);
        assert_eq!(report.total_rows, 10);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pages[0].as_str(), "Weekly Sales");

        let page = sink.page("Weekly Sales").unwrap();
        assert_eq!(page.header, vec!["id"]);
        assert_eq!(page.rows.len(), 10);
    }

    #[tokio::test]
    async fn test_small_batches_preserve_order() {
        let (sink, writer) = writer_with(3);
        writer.write(&item(), &table(10), None).await.unwrap();

        let page = sink.page("Weekly Sales").unwrap();
        let values: Vec<String> = page.rows.iter().map(|r| r[0].clone()).collect();
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(values, expected);
    }

    #[tokio::test]
    async fn test_chunked_write_duplicates_header_per_page() {
        let (sink, writer) = writer_with(3000);
        let t = table(2500);
        let plan = ChunkPlan::build(2500, 1000).unwrap();

        let report = writer.write(&item(), &t, Some(&plan)).await.unwrap();

        assert!(report.chunked);
        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.total_rows, 2500);

        let p1 = sink.page("Weekly Sales (part 1)").unwrap();
        let p2 = sink.page("Weekly Sales (part 2)").unwrap();
        let p3 = sink.page("Weekly Sales (part 3)").unwrap();
        assert_eq!(p1.rows.len(), 1000);
        assert_eq!(p2.rows.len(), 1000);
        assert_eq!(p3.rows.len(), 500);
        assert_eq!(p1.header, vec!["id"]);
        assert_eq!(p2.header, vec!["id"]);
        assert_eq!(p3.header, vec!["id"]);
    }

    #[tokio::test]
    async fn test_chunked_write_reconstructs_row_order() {
        let (sink, writer) = writer_with(3000);
        let t = table(250);
        let plan = ChunkPlan::build(250, 100).unwrap();
        writer.write(&item(), &t, Some(&plan)).await.unwrap();

        let mut all_rows = Vec::new();
        for part in 1..=3 {
            let page = sink.page(&format!("Weekly Sales (part {part})")).unwrap();
            all_rows.extend(page.rows.iter().map(|r| r[0].clone()));
        }
        let expected: Vec<String> = (0..250).map(|i| i.to_string()).collect();
        assert_eq!(all_rows, expected);
    }

    #[tokio::test]
    async fn test_rewrite_replaces_pages() {
        let (sink, writer) = writer_with(3000);
        writer.write(&item(), &table(10), None).await.unwrap();
        writer.write(&item(), &table(4), None).await.unwrap();

        let page = sink.page("Weekly Sales").unwrap();
        assert_eq!(page.rows.len(), 4);
        assert_eq!(sink.page_count(), 1);
    }
}
