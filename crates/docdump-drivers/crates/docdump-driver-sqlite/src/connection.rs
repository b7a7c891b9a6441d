//! SQLite connection implementation

use async_trait::async_trait;
use docdump_core::{
    ColumnMeta, Connection, DocdumpError, QueryResult, Result, Row, SchemaIntrospection,
    StatementResult, Value,
};
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};

use crate::DeclaredType;

/// How the database file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenMode {
    ReadWrite,
    ReadOnly,
}

/// SQLite connection wrapper
///
/// The rusqlite handle is dropped on [`Connection::close`]; every later call
/// fails with a connection error.
pub struct SqliteConnection {
    conn: Mutex<Option<RusqliteConnection>>,
    path: String,
    typed_booleans: bool,
}

impl SqliteConnection {
    /// Open (or create) a SQLite database for reading and writing
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_mode(path, OpenMode::ReadWrite)
    }

    /// Open an existing SQLite database without write access.
    ///
    /// A missing file or a file that is not a SQLite database is a connection
    /// error; nothing is created on disk.
    pub fn open_read_only(path: &str) -> Result<Self> {
        Self::open_with_mode(path, OpenMode::ReadOnly)
    }

    fn open_with_mode(path: &str, mode: OpenMode) -> Result<Self> {
        tracing::info!(path = %path, ?mode, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                DocdumpError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if mode == OpenMode::ReadOnly && !file_path.exists() {
                    return Err(DocdumpError::Connection(format!(
                        "Database file does not exist: {}",
                        expanded_path
                    )));
                }
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(DocdumpError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            let flags = match mode {
                OpenMode::ReadWrite => {
                    OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
                }
                OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            } | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                DocdumpError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        if mode == OpenMode::ReadWrite {
            conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
                DocdumpError::Connection(format!("Failed to enable foreign keys: {}", e))
            })?;
            conn.pragma_update(None, "synchronous", "NORMAL").map_err(|e| {
                DocdumpError::Connection(format!("Failed to set synchronous mode: {}", e))
            })?;
        }

        // SQLite opens lazily; reading the schema cookie forces the header check
        // so that garbage files fail here instead of on the first table.
        conn.query_row("PRAGMA schema_version", [], |row| row.get::<_, i64>(0))
            .map_err(|e| {
                DocdumpError::Connection(format!(
                    "'{}' is not a readable SQLite database: {}",
                    expanded_path, e
                ))
            })?;

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: expanded_path,
            typed_booleans: false,
        })
    }

    /// Report `0`/`1` in `BOOLEAN` columns as booleans instead of integers
    pub fn with_typed_booleans(mut self, enabled: bool) -> Self {
        self.typed_booleans = enabled;
        self
    }

    /// The resolved database path (`:memory:` for in-memory databases)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Expand path to handle ~ (home directory) and relative paths
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest).to_string_lossy().to_string(),
                None => {
                    return Err(DocdumpError::Configuration(
                        "Unable to determine HOME directory".into(),
                    ));
                }
            }
        } else if path.starts_with('~') {
            return Err(DocdumpError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        if path_buf.is_relative() {
            Ok(std::env::current_dir()?
                .join(path_buf)
                .to_string_lossy()
                .to_string())
        } else {
            Ok(expanded)
        }
    }

    /// Run `f` against the open handle, or fail if the connection was closed
    fn with_conn<T>(&self, f: impl FnOnce(&RusqliteConnection) -> Result<T>) -> Result<T> {
        let guard = self.conn.lock();
        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(DocdumpError::Connection(
                "SQLite connection is closed".into(),
            )),
        }
    }

    /// Execute multiple SQL statements in a batch
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::debug!("executing SQL batch");
        self.with_conn(|conn| {
            conn.execute_batch(sql)
                .map_err(|e| query_error("Failed to execute batch", e))
        })
    }
}

/// Map a rusqlite failure onto the core error type.
///
/// Missing tables get their own variant so callers can tell them apart from
/// other query faults.
fn query_error(context: &str, error: rusqlite::Error) -> DocdumpError {
    let message = error.to_string();
    if let Some(table) = message.strip_prefix("no such table: ") {
        return DocdumpError::NotFound(format!("no such table: {}", table));
    }
    DocdumpError::Query(format!("{}: {}", context, message))
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let rusqlite_params = values_to_rusqlite(params);
        let rows_affected = self.with_conn(|conn| {
            conn.execute(sql, params_from_iter(rusqlite_params.iter()))
                .map_err(|e| query_error("Failed to execute statement", e))
        })?;

        tracing::debug!(affected_rows = rows_affected, "statement executed");
        Ok(StatementResult {
            affected_rows: rows_affected as u64,
        })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let rusqlite_params = values_to_rusqlite(params);
        let typed_booleans = self.typed_booleans;

        let (columns, rows) = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| query_error("Failed to prepare query", e))?;

            let mut column_names: Vec<String> = Vec::with_capacity(stmt.column_count());
            let mut columns: Vec<ColumnMeta> = Vec::with_capacity(stmt.column_count());
            let mut declared: Vec<DeclaredType> = Vec::with_capacity(stmt.column_count());

            for (idx, col) in stmt.columns().iter().enumerate() {
                let name = col.name().to_string();
                declared.push(DeclaredType::parse(col.decl_type()));
                column_names.push(name.clone());
                columns.push(ColumnMeta {
                    name,
                    data_type: col.decl_type().unwrap_or("DYNAMIC").to_string(),
                    ordinal: idx,
                });
            }

            let mut rows = Vec::new();
            let mut query_rows = stmt
                .query(params_from_iter(rusqlite_params.iter()))
                .map_err(|e| query_error("Failed to execute query", e))?;

            while let Some(row) = query_rows
                .next()
                .map_err(|e| query_error("Failed to fetch row", e))?
            {
                let mut values = Vec::with_capacity(declared.len());
                for (i, decl) in declared.iter().enumerate() {
                    let value_ref = row
                        .get_ref(i)
                        .map_err(|e| query_error("Failed to read column", e))?;
                    values.push(decl.convert(value_ref, typed_booleans));
                }
                rows.push(Row::new(column_names.clone(), values));
            }

            Ok((columns, rows))
        })?;

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );
        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        let Some(conn) = self.conn.lock().take() else {
            return Ok(());
        };
        tracing::info!(path = %self.path, "closing SQLite connection");
        conn.close().map_err(|(_, e)| {
            DocdumpError::Connection(format!("Failed to close SQLite connection: {}", e))
        })
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(self)
    }
}

fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Int64(i) => Sql::Integer(*i),
        Value::Float64(f) => Sql::Real(*f),
        Value::Decimal(d) => Sql::Text(d.clone()),
        Value::String(s) => Sql::Text(s.clone()),
        Value::Bytes(b) => Sql::Blob(b.clone()),
        Value::Date(d) => Sql::Text(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => Sql::Text(t.format("%H:%M:%S%.f").to_string()),
        Value::DateTime(dt) => Sql::Text(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::DateTimeUtc(dt) => Sql::Text(dt.to_rfc3339()),
        Value::Json(j) => Sql::Text(j.to_string()),
        Value::Array(_) => Sql::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_reports_declared_types() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        conn.execute_batch(
            "CREATE TABLE orders (id INTEGER PRIMARY KEY, order_date DATE, total DECIMAL(10,2));
             INSERT INTO orders VALUES (1, '2023-06-18', 2099.9700000000003);",
        )
        .await
        .unwrap();

        let result = conn.query("SELECT * FROM orders", &[]).await.unwrap();
        assert_eq!(result.columns[1].data_type, "DATE");
        assert_eq!(result.columns[2].ordinal, 2);

        let row = &result.rows[0];
        assert_eq!(
            row.get_by_name("order_date"),
            Some(&Value::Date(
                chrono::NaiveDate::from_ymd_opt(2023, 6, 18).unwrap()
            ))
        );
        assert_eq!(
            row.get_by_name("total"),
            Some(&Value::Decimal("2099.97".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        let err = conn.query("SELECT * FROM ghosts", &[]).await.unwrap_err();
        assert!(matches!(err, DocdumpError::NotFound(_)), "got {err:?}");

        let err = conn.query("SELEC nonsense", &[]).await.unwrap_err();
        assert!(matches!(err, DocdumpError::Query(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_queries() {
        let conn = SqliteConnection::open(":memory:").unwrap();
        assert!(!conn.is_closed());

        conn.close().await.unwrap();
        conn.close().await.unwrap();
        assert!(conn.is_closed());

        let err = conn.query("SELECT 1", &[]).await.unwrap_err();
        assert!(err.is_connection());
    }

    #[test]
    fn test_read_only_open_does_not_create_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        let err = SqliteConnection::open_read_only(path.to_str().unwrap())
            .err()
            .unwrap();
        assert!(err.is_connection());
        assert!(!path.exists());
    }

    #[test]
    fn test_read_only_open_rejects_non_database_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        std::fs::write(&path, "not a database\n".repeat(512)).unwrap();

        let err = SqliteConnection::open_read_only(path.to_str().unwrap())
            .err()
            .unwrap();
        assert!(err.is_connection());
    }
}
