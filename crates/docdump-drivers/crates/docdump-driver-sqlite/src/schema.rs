//! Catalog introspection for SQLite

use async_trait::async_trait;
use docdump_core::{Connection, Result, SchemaIntrospection, TableInfo, Value};

use crate::SqliteConnection;

/// User tables in creation order. `sqlite_sequence`, `sqlite_stat*` and other
/// internal tables share the reserved `sqlite_` prefix. A plain `LIKE` would
/// treat `_` as a wildcard and ignore case, hiding tables like `sqliteusers`.
const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' \
     ORDER BY rowid";

#[async_trait]
impl SchemaIntrospection for SqliteConnection {
    #[tracing::instrument(skip(self))]
    async fn list_tables(&self, _schema: Option<&str>) -> Result<Vec<TableInfo>> {
        tracing::debug!("listing tables from sqlite_master");
        let result = self.query(LIST_TABLES_SQL, &[]).await?;

        let tables: Vec<TableInfo> = result
            .rows
            .iter()
            .filter_map(|row| row.get(0).and_then(|v| v.as_str()))
            .map(|name| TableInfo {
                schema: Some("main".to_string()),
                name: name.to_string(),
            })
            .collect();

        tracing::debug!(table_count = tables.len(), "tables listed");
        Ok(tables)
    }

    async fn table_exists(&self, _schema: Option<&str>, name: &str) -> Result<bool> {
        let result = self
            .query(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
                &[Value::String(name.to_string())],
            )
            .await?;
        Ok(result.has_rows())
    }
}
