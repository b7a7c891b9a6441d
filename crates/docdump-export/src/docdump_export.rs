//! docdump export engine
//!
//! Turns every table of a relational store into a JSON array of row
//! documents, keyed by table name.
//!
//! ```text
//! ExportOrchestrator ─┬─ discovery::list_tables      (no explicit list)
//!                     ├─ table_exporter::export_table (per table)
//!                     │      └─ normalize::normalize  (per value)
//!                     └─ DocumentWriter::write        (once, atomically)
//! ```
//!
//! A table that cannot be read is recorded as skipped and the run goes on;
//! only a dead connection or a failed write ends a run.

pub mod discovery;
mod document;
mod error;
mod normalize;
mod orchestrator;
pub mod table_exporter;
mod writer;

pub use document::{
    Document, ExportOutcome, ExportResult, SkipKind, SkippedTable, TableSummary,
};
pub use error::ExportError;
pub use normalize::{BinaryEncoding, DocValue, NormalizeOptions, normalize};
pub use orchestrator::{
    ExportOptions, ExportOrchestrator, ExportPhase, ExportProgress, ExportProgressCallback,
    ExportReport, ExportRequest, run,
};
pub use writer::DocumentWriter;
