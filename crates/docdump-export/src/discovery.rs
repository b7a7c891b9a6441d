//! Schema discovery

use docdump_core::{Connection, DocdumpError};

use crate::ExportError;

/// List the user tables of the store, in the store's catalog order.
///
/// An empty store gives an empty list. Any failure to read the catalog means
/// nothing can be exported and is reported as a connection error.
#[tracing::instrument(skip(connection), fields(driver = connection.driver_name()))]
pub async fn list_tables(connection: &dyn Connection) -> Result<Vec<String>, ExportError> {
    if connection.is_closed() {
        return Err(ExportError::Connection(
            "cannot discover tables: connection is closed".into(),
        ));
    }

    let introspection = connection.as_schema_introspection().ok_or_else(|| {
        ExportError::Configuration(format!(
            "the {} driver cannot list tables; pass an explicit table list",
            connection.driver_name()
        ))
    })?;

    let tables = introspection.list_tables(None).await.map_err(|e| match e {
        DocdumpError::Connection(msg) => ExportError::Connection(msg),
        other => ExportError::Connection(format!("failed to read the table catalog: {}", other)),
    })?;

    let names: Vec<String> = tables.into_iter().map(|t| t.name).collect();
    tracing::debug!(table_count = names.len(), "discovered tables");
    Ok(names)
}
