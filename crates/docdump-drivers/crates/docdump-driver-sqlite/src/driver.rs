//! SQLite driver implementation

use async_trait::async_trait;
use docdump_core::{Connection, ConnectionConfig, DatabaseDriver, DocdumpError, Result};
use std::sync::Arc;

use crate::SqliteConnection;

/// SQLite database driver
///
/// Recognised connection parameters:
/// - `path` / `database`: file path or `:memory:`
/// - `read_only`: open without write access and never create the file
/// - `typed_booleans`: report `BOOLEAN` columns as booleans
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["sqlite", "sqlite3"]
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config.get_string("path").ok_or_else(|| {
            DocdumpError::Configuration(
                "SQLite requires a 'path' or 'database' parameter, e.g. ./shop.db or :memory:"
                    .into(),
            )
        })?;

        let conn = if config.get_bool("read_only") {
            SqliteConnection::open_read_only(&path)
        } else {
            SqliteConnection::open(&path)
        }
        .map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            match e {
                DocdumpError::Connection(_) | DocdumpError::Configuration(_) => e,
                other => DocdumpError::Connection(format!(
                    "Failed to connect to SQLite database: {}",
                    other
                )),
            }
        })?
        .with_typed_booleans(config.get_bool("typed_booleans"));

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }

    fn parse_connection_string(&self, conn_str: &str) -> Result<ConnectionConfig> {
        let trimmed = conn_str.trim();
        let path = match trimmed.split_once(':') {
            Some((scheme, rest)) if self.schemes().contains(&scheme.to_ascii_lowercase().as_str()) => {
                rest.strip_prefix("//").unwrap_or(rest)
            }
            _ => trimmed,
        };

        if path.is_empty() {
            return Err(DocdumpError::Configuration(format!(
                "Connection string '{}' does not name a database file",
                conn_str
            )));
        }
        Ok(ConnectionConfig::new_sqlite(path))
    }
}
