//! Export orchestration
//!
//! Drives the table exporter over a set of tables with per-table failure
//! isolation, and owns the connection lifetime of a complete run.

use docdump_core::{Connection, ConnectionConfig, DatabaseDriver};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    DocumentWriter, ExportError, ExportOutcome, ExportResult, NormalizeOptions, SkipKind,
    SkippedTable, TableSummary, discovery, table_exporter,
};

/// Options for export operations
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Tables to leave out, applied to discovered and explicit lists alike
    pub exclude_tables: Vec<String>,
    /// Value normalization settings
    pub normalize: NormalizeOptions,
}

impl ExportOptions {
    pub fn with_exclude(mut self, tables: Vec<String>) -> Self {
        self.exclude_tables = tables;
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    fn is_excluded(&self, table: &str) -> bool {
        self.exclude_tables.iter().any(|t| t == table)
    }
}

/// Progress callback for export operations
pub type ExportProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress information
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current phase of export
    pub phase: ExportPhase,
    /// Table the event is about
    pub current_table: Option<String>,
    /// Total number of tables to export (0 until known)
    pub total_tables: usize,
    /// Number of tables finished, exported or skipped
    pub tables_completed: usize,
    /// Rows exported so far (for the current table on `TableExported`)
    pub rows_exported: u64,
    /// Log message
    pub message: Option<String>,
}

/// Phases of the export process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Starting,
    DiscoveringTables,
    ExportingTable,
    TableExported,
    TableSkipped,
    Writing,
    Complete,
}

/// Exports a set of tables over one connection
pub struct ExportOrchestrator {
    connection: Arc<dyn Connection>,
    options: ExportOptions,
    progress: Option<ExportProgressCallback>,
}

impl ExportOrchestrator {
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            options: ExportOptions::default(),
            progress: None,
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: ExportProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn report(
        &self,
        phase: ExportPhase,
        current_table: Option<&str>,
        total_tables: usize,
        tables_completed: usize,
        rows_exported: u64,
        message: String,
    ) {
        if let Some(progress) = &self.progress {
            progress(ExportProgress {
                phase,
                current_table: current_table.map(str::to_string),
                total_tables,
                tables_completed,
                rows_exported,
                message: Some(message),
            });
        }
    }

    /// Decide which tables to export, in order.
    ///
    /// Explicit lists keep the caller's order with repeats dropped; otherwise
    /// the store's catalog order is used.
    async fn table_set(&self, tables: Option<&[String]>) -> Result<Vec<String>, ExportError> {
        let candidates: Vec<String> = match tables {
            Some(tables) => {
                let mut seen = HashSet::new();
                tables
                    .iter()
                    .filter(|t| seen.insert(t.as_str()))
                    .cloned()
                    .collect()
            }
            None => {
                self.report(
                    ExportPhase::DiscoveringTables,
                    None,
                    0,
                    0,
                    0,
                    "Discovering tables...".into(),
                );
                discovery::list_tables(self.connection.as_ref()).await?
            }
        };

        Ok(candidates
            .into_iter()
            .filter(|t| {
                let excluded = self.options.is_excluded(t);
                if excluded {
                    tracing::debug!(table = %t, "table excluded");
                }
                !excluded
            })
            .collect())
    }

    /// Export `tables`, or every discovered table when `None`.
    ///
    /// A table that is missing or fails to read is recorded as skipped and
    /// the run continues. A connection failure ends the run.
    #[tracing::instrument(skip(self, tables), fields(explicit = tables.is_some()))]
    pub async fn export_all(&self, tables: Option<&[String]>) -> Result<ExportOutcome, ExportError> {
        self.report(
            ExportPhase::Starting,
            None,
            0,
            0,
            0,
            "Export started".into(),
        );

        let tables = self.table_set(tables).await?;
        let total_tables = tables.len();
        tracing::info!(total_tables, "exporting tables");

        let mut result = ExportResult::new();
        let mut skipped = Vec::new();

        for (idx, table) in tables.iter().enumerate() {
            self.report(
                ExportPhase::ExportingTable,
                Some(table),
                total_tables,
                idx,
                0,
                format!("Exporting table '{}'", table),
            );

            match table_exporter::export_table(
                self.connection.as_ref(),
                table,
                &self.options.normalize,
            )
            .await
            {
                Ok(documents) => {
                    let rows = documents.len();
                    tracing::info!(table = %table, rows, "Exported {} rows from table '{}'", rows, table);
                    result.insert(table.clone(), documents);
                    self.report(
                        ExportPhase::TableExported,
                        Some(table),
                        total_tables,
                        idx + 1,
                        rows as u64,
                        format!("Exported {} rows from table '{}'", rows, table),
                    );
                }
                Err(e) if e.is_table_scoped() && !self.connection.is_closed() => {
                    let kind = match e {
                        ExportError::TableNotFound(_) => SkipKind::NotFound,
                        _ => SkipKind::QueryFailed,
                    };
                    tracing::warn!(table = %table, error = %e, "skipping table");
                    self.report(
                        ExportPhase::TableSkipped,
                        Some(table),
                        total_tables,
                        idx + 1,
                        0,
                        format!("Skipped table '{}': {}", table, e),
                    );
                    skipped.push(SkippedTable {
                        name: table.clone(),
                        kind,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    tracing::error!(table = %table, error = %e, "export aborted");
                    return Err(match e {
                        ExportError::Connection(_) => e,
                        other => ExportError::Connection(other.to_string()),
                    });
                }
            }
        }

        Ok(ExportOutcome { result, skipped })
    }
}

/// Everything a complete run needs besides the connection settings
pub struct ExportRequest {
    /// Explicit tables, or `None` to export all discovered tables
    pub tables: Option<Vec<String>>,
    /// Output file, or `None` for the writer's default name
    pub output: Option<PathBuf>,
    pub options: ExportOptions,
    pub writer: DocumentWriter,
    pub progress: Option<ExportProgressCallback>,
}

impl ExportRequest {
    pub fn new(writer: DocumentWriter) -> Self {
        Self {
            tables: None,
            output: None,
            options: ExportOptions::default(),
            writer,
            progress: None,
        }
    }

    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = Some(tables);
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: ExportProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub tables: Vec<TableSummary>,
    pub skipped: Vec<SkippedTable>,
}

impl ExportReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}

/// Open a connection, export, close the connection, write the output file.
///
/// The connection is closed on every path once it has been opened. Nothing is
/// written unless the export itself succeeded.
pub async fn run(
    driver: &dyn DatabaseDriver,
    config: &ConnectionConfig,
    request: ExportRequest,
) -> Result<ExportReport, ExportError> {
    let ExportRequest {
        tables,
        output,
        options,
        writer,
        progress,
    } = request;

    let connection = driver.connect(config).await.map_err(|e| match e {
        docdump_core::DocdumpError::Configuration(msg) => ExportError::Configuration(msg),
        docdump_core::DocdumpError::Connection(msg) => ExportError::Connection(msg),
        other => ExportError::Connection(other.to_string()),
    })?;

    let mut orchestrator = ExportOrchestrator::new(connection.clone()).with_options(options);
    if let Some(progress) = progress {
        orchestrator = orchestrator.with_progress(progress);
    }

    let outcome = orchestrator.export_all(tables.as_deref()).await;

    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "failed to close connection");
    }

    let ExportOutcome { result, skipped } = outcome?;
    let total_tables = result.len() + skipped.len();

    orchestrator.report(
        ExportPhase::Writing,
        None,
        total_tables,
        total_tables,
        result.total_rows() as u64,
        "Writing output file...".into(),
    );
    let output_path = writer.write(&result, output.as_deref())?;

    orchestrator.report(
        ExportPhase::Complete,
        None,
        total_tables,
        total_tables,
        result.total_rows() as u64,
        format!("Export written to {}", output_path.display()),
    );

    Ok(ExportReport {
        output_path,
        tables: result.summaries(),
        skipped,
    })
}
