//! Result table and chunk planning
//!
//! A `ResultTable` is the parsed form of one downloaded export result:
//! a header row plus ordered data rows. A `ChunkPlan` partitions an
//! oversized table into pages that fit the sink's per-page row capacity.

use serde::{Deserialize, Serialize};

/// Header row plus ordered data rows from one export result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    /// Column names
    pub header: Vec<String>,

    /// Data rows, in download order
    pub rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Create a table from a header and rows
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Number of data rows (header excluded)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the header
    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// True iff the table exceeds the sink's per-page row capacity
    pub fn needs_chunking(&self, max_rows_per_page: usize) -> bool {
        self.row_count() > max_rows_per_page
    }
}

/// One contiguous row range destined for one output page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 1-based ordinal, used in the page-name suffix
    pub ordinal: usize,

    /// First row index (inclusive)
    pub start: usize,

    /// Last row index (exclusive)
    pub end: usize,
}

impl Chunk {
    /// Number of rows in this chunk
    pub fn row_count(&self) -> usize {
        self.end - self.start
    }
}

/// Ordered partition of a table's rows into bounded pages
///
/// Invariants: chunk count equals `ceil(row_count / max_rows_per_page)`;
/// concatenating the ranges in order reconstructs the original row order
/// exactly once (no gaps, no overlaps); every chunk is full-sized except
/// possibly the last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPlan {
    /// Per-page row capacity the plan was built against
    pub max_rows_per_page: usize,

    /// Ordered chunks
    pub chunks: Vec<Chunk>,
}

impl ChunkPlan {
    /// Build a plan for `row_count` rows at `max_rows_per_page` capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_rows_per_page` is zero.
    pub fn build(row_count: usize, max_rows_per_page: usize) -> Result<Self, String> {
        if max_rows_per_page == 0 {
            return Err("max_rows_per_page must be greater than zero".to_string());
        }

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut ordinal = 1;
        while start < row_count {
            let end = (start + max_rows_per_page).min(row_count);
            chunks.push(Chunk {
                ordinal,
                start,
                end,
            });
            start = end;
            ordinal += 1;
        }

        Ok(Self {
            max_rows_per_page,
            chunks,
        })
    }

    /// Number of pages in the plan
    pub fn page_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total rows covered by the plan
    pub fn total_rows(&self) -> usize {
        self.chunks.iter().map(Chunk::row_count).sum()
    }
}
