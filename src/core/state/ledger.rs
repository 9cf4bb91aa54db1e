//! Completed-work ledger
//!
//! Upsert-by-id set of work items that have been fully processed, with
//! enough metadata to skip re-processing on a later run.

use crate::domain::ids::{PageName, WorkItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One fully processed work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Work item this entry records
    pub work_item_id: WorkItemId,

    /// Display name at processing time
    pub display_name: String,

    /// Output pages written for this item
    pub pages: Vec<PageName>,

    /// Rows written (header excluded)
    pub row_count: usize,

    /// Columns in the result
    pub column_count: usize,

    /// When the item was processed. Entries migrated from older state may
    /// have no timestamp; the freshness policy treats those as stale.
    pub processed_at: Option<DateTime<Utc>>,
}

/// Per-work-item freshness metadata, persisted under its own key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessRecord {
    /// Last time the item was fully processed
    pub last_updated: DateTime<Utc>,

    /// Row count at that time
    pub row_count: usize,
}

/// Append-only (upsert-by-id) set of completed work items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedLedger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl CompletedLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a work item.
    ///
    /// Upsert semantics make `mark_complete` idempotent: recording the
    /// same item twice leaves exactly one entry.
    pub fn upsert(&mut self, entry: LedgerEntry) {
        self.entries
            .insert(entry.work_item_id.as_str().to_string(), entry);
    }

    /// Look up the entry for a work item
    pub fn get(&self, id: &WorkItemId) -> Option<&LedgerEntry> {
        self.entries.get(id.as_str())
    }

    /// Whether the ledger records this work item
    pub fn contains(&self, id: &WorkItemId) -> bool {
        self.entries.contains_key(id.as_str())
    }

    /// Number of recorded items
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in id order
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn entry(id: &str, rows: usize) -> LedgerEntry {
        LedgerEntry {
            work_item_id: WorkItemId::from_str(id).unwrap(),
            display_name: format!("Report {id}"),
            pages: vec![PageName::new(format!("Report {id}")).unwrap()],
            row_count: rows,
            column_count: 4,
            processed_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", 10));
        ledger.upsert(entry("rpt-1", 20));

        assert_eq!(ledger.len(), 1);
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert_eq!(ledger.get(&id).unwrap().row_count, 20);
    }

    #[test]
    fn test_contains() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", 10));

        assert!(ledger.contains(&WorkItemId::from_str("rpt-1").unwrap()));
        assert!(!ledger.contains(&WorkItemId::from_str("rpt-2").unwrap()));
    }

    #[test]
    fn test_entries_iterate_in_id_order() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-b", 1));
        ledger.upsert(entry("rpt-a", 1));

        let ids: Vec<&str> = ledger
            .entries()
            .map(|e| e.work_item_id.as_str())
            .collect();
        assert_eq!(ids, vec!["rpt-a", "rpt-b"]);
    }

    #[test]
    fn test_serde_round_trip() {
        let mut ledger = CompletedLedger::new();
        ledger.upsert(entry("rpt-1", 100));

        let json = serde_json::to_value(&ledger).unwrap();
        let back: CompletedLedger = serde_json::from_value(json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(
            back.get(&WorkItemId::from_str("rpt-1").unwrap())
                .unwrap()
                .row_count,
            100
        );
    }

    #[test]
    fn test_entry_without_timestamp_deserializes() {
        // State written before freshness tracking predates processed_at.
        let json = serde_json::json!({
            "entries": {
                "rpt-1": {
                    "work_item_id": "rpt-1",
                    "display_name": "Report rpt-1",
                    "pages": ["Report rpt-1"],
                    "row_count": 5,
                    "column_count": 2,
                    "processed_at": null
                }
            }
        });
        let ledger: CompletedLedger = serde_json::from_value(json).unwrap();
        let id = WorkItemId::from_str("rpt-1").unwrap();
        assert!(ledger.get(&id).unwrap().processed_at.is_none());
    }
}
