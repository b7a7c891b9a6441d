//! Exported documents and run results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DocValue;

/// One exported row: column name to normalized value, in result-set order
pub type Document = IndexMap<String, DocValue>;

/// Table name to exported rows, in export order
///
/// Only tables that exported successfully appear here. Serializes as a plain
/// JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportResult {
    tables: IndexMap<String, Vec<Document>>,
}

impl ExportResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table's rows. A table that is already present keeps its position.
    pub fn insert(&mut self, table: impl Into<String>, documents: Vec<Document>) {
        self.tables.insert(table.into(), documents);
    }

    pub fn get(&self, table: &str) -> Option<&[Document]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Number of tables
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Document])> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn total_rows(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Row counts per table, in export order
    pub fn summaries(&self) -> Vec<TableSummary> {
        self.iter()
            .map(|(name, rows)| TableSummary {
                name: name.to_string(),
                rows: rows.len(),
            })
            .collect()
    }
}

/// Why a table was left out of the result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    NotFound,
    QueryFailed,
}

impl std::fmt::Display for SkipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipKind::NotFound => f.write_str("not found"),
            SkipKind::QueryFailed => f.write_str("query failed"),
        }
    }
}

/// A requested table that could not be exported
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTable {
    pub name: String,
    pub kind: SkipKind,
    pub reason: String,
}

/// Row count of one exported table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
}

/// What `export_all` produced: the exported tables plus the skipped ones
#[derive(Debug, Clone, Default)]
pub struct ExportOutcome {
    pub result: ExportResult,
    pub skipped: Vec<SkippedTable>,
}
