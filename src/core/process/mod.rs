//! Result payload processing
//!
//! Parses downloaded export payloads (CSV text) into a header/row table
//! and decides whether the table needs chunking to fit the sink's
//! per-page capacity. No network or persistence side effects; pure
//! function of the input plus configuration.

use crate::config::SinkConfig;
use crate::domain::{ChunkPlan, HaulerError, Result, ResultTable};

/// Parses export payloads and plans chunked writes
#[derive(Debug, Clone)]
pub struct DataProcessor {
    max_rows_per_page: usize,
}

impl DataProcessor {
    /// Create a processor bound to the sink's page capacity
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            max_rows_per_page: config.max_rows_per_page,
        }
    }

    /// Create a processor with an explicit page capacity
    pub fn with_capacity(max_rows_per_page: usize) -> Self {
        Self { max_rows_per_page }
    }

    /// Parse a raw CSV payload into a table.
    ///
    /// The first record is the header; remaining records are data rows.
    /// Rows shorter than the header are padded with empty cells, longer
    /// rows are kept as-is (the sink does not care). Quoting and embedded
    /// newlines follow CSV conventions.
    ///
    /// # Errors
    ///
    /// Returns `HaulerError::MalformedPayload` if the payload has no
    /// header or parses to zero data rows.
    pub fn parse_result(&self, raw: &str) -> Result<ResultTable> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_reader(raw.as_bytes());

        let mut records = reader.records();

        let header: Vec<String> = match records.next() {
            Some(Ok(record)) => record.iter().map(str::to_string).collect(),
            Some(Err(e)) => {
                return Err(HaulerError::MalformedPayload(format!(
                    "Unreadable header row: {e}"
                )))
            }
            None => {
                return Err(HaulerError::MalformedPayload(
                    "Payload is empty".to_string(),
                ))
            }
        };

        let width = header.len();
        let mut rows = Vec::new();
        for record in records {
            let record = record.map_err(|e| {
                HaulerError::MalformedPayload(format!(
                    "Unreadable row {}: {e}",
                    rows.len() + 2
                ))
            })?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() < width {
                row.resize(width, String::new());
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(HaulerError::MalformedPayload(
                "Payload parsed to zero data rows".to_string(),
            ));
        }

        tracing::debug!(
            rows = rows.len(),
            columns = width,
            "Parsed export payload"
        );

        Ok(ResultTable::new(header, rows))
    }

    /// Whether a table exceeds the page capacity
    pub fn needs_chunking(&self, table: &ResultTable) -> bool {
        table.needs_chunking(self.max_rows_per_page)
    }

    /// Build a chunk plan when the table needs one.
    ///
    /// Returns `None` for tables that fit a single page.
    pub fn plan_chunks(&self, table: &ResultTable) -> Result<Option<ChunkPlan>> {
        if !self.needs_chunking(table) {
            return Ok(None);
        }

        let plan = ChunkPlan::build(table.row_count(), self.max_rows_per_page)
            .map_err(HaulerError::Other)?;

        tracing::info!(
            rows = table.row_count(),
            pages = plan.page_count(),
            max_rows_per_page = self.max_rows_per_page,
            "Result requires chunking"
        );

        Ok(Some(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(max: usize) -> DataProcessor {
        DataProcessor::with_capacity(max)
    }

    #[test]
    fn test_parse_simple_payload() {
        let table = processor(1000)
            .parse_result("id,amount\n1,10.00\n2,20.00\n")
            .unwrap();
        assert_eq!(table.header, vec!["id", "amount"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1], vec!["2", "20.00"]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let table = processor(1000)
            .parse_result("name,notes\n\"Smith, Jane\",\"line one\nline two\"\n")
            .unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][0], "Smith, Jane");
        assert!(table.rows[0][1].contains('\n'));
    }

    #[test]
    fn test_short_rows_padded_to_header_width() {
        let table = processor(1000)
            .parse_result("a,b,c\n1,2\n")
            .unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        let err = processor(1000).parse_result("").unwrap_err();
        assert!(matches!(err, HaulerError::MalformedPayload(_)));
    }

    #[test]
    fn test_header_only_payload_is_malformed() {
        let err = processor(1000).parse_result("id,amount\n").unwrap_err();
        assert!(matches!(err, HaulerError::MalformedPayload(_)));
    }

    #[test]
    fn test_plan_chunks_none_when_fits() {
        let p = processor(10);
        let table = p.parse_result("id\n1\n2\n3\n").unwrap();
        assert!(!p.needs_chunking(&table));
        assert!(p.plan_chunks(&table).unwrap().is_none());
    }

    #[test]
    fn test_plan_chunks_when_oversized() {
        let p = processor(2);
        let table = p.parse_result("id\n1\n2\n3\n4\n5\n").unwrap();
        assert!(p.needs_chunking(&table));
        let plan = p.plan_chunks(&table).unwrap().unwrap();
        assert_eq!(plan.page_count(), 3);
        assert_eq!(plan.total_rows(), 5);
    }
}
