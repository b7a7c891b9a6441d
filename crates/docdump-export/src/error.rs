//! Export errors

use docdump_core::DocdumpError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors during export
///
/// `TableNotFound` and `Query` only ever concern one table and are turned into
/// skipped tables by the orchestrator. The other variants end the run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Query error: {message}")]
    Query {
        table: Option<String>,
        message: String,
    },

    #[error("Failed to write '{}': {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ExportError {
    /// Whether the error concerns a single table rather than the whole run
    pub fn is_table_scoped(&self) -> bool {
        matches!(self, ExportError::TableNotFound(_) | ExportError::Query { .. })
    }

    pub(crate) fn write(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        ExportError::Write {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<DocdumpError> for ExportError {
    fn from(e: DocdumpError) -> Self {
        match e {
            DocdumpError::Connection(msg) => ExportError::Connection(msg),
            DocdumpError::NotFound(msg) => ExportError::TableNotFound(msg),
            DocdumpError::Configuration(msg) => ExportError::Configuration(msg),
            other => ExportError::Query {
                table: None,
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_export_errors() {
        assert!(matches!(
            ExportError::from(DocdumpError::Connection("gone".into())),
            ExportError::Connection(_)
        ));
        assert!(matches!(
            ExportError::from(DocdumpError::NotFound("no such table: ghosts".into())),
            ExportError::TableNotFound(_)
        ));
        assert!(matches!(
            ExportError::from(DocdumpError::Query("syntax".into())),
            ExportError::Query { table: None, .. }
        ));
    }

    #[test]
    fn test_scope() {
        assert!(ExportError::TableNotFound("ghosts".into()).is_table_scoped());
        assert!(!ExportError::Connection("closed".into()).is_table_scoped());
        assert!(!ExportError::write("/nope/out.json", "denied").is_table_scoped());
    }
}
