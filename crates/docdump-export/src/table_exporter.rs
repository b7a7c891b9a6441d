//! Single table export

use docdump_core::{Connection, DocdumpError};

use crate::{Document, ExportError, NormalizeOptions, normalize};

/// Quote an identifier for use in SQL, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read every row of `table` and normalize it into documents.
///
/// Documents keep the column order of the result set and the rows keep the
/// order the store returned them in.
#[tracing::instrument(skip(connection, options))]
pub async fn export_table(
    connection: &dyn Connection,
    table: &str,
    options: &NormalizeOptions,
) -> Result<Vec<Document>, ExportError> {
    let sql = format!("SELECT * FROM {}", quote_identifier(table));

    let result = connection.query(&sql, &[]).await.map_err(|e| match e {
        DocdumpError::Connection(msg) => ExportError::Connection(msg),
        DocdumpError::NotFound(_) => ExportError::TableNotFound(table.to_string()),
        other => ExportError::Query {
            table: Some(table.to_string()),
            message: other.to_string(),
        },
    })?;

    let documents: Vec<Document> = result
        .rows
        .into_iter()
        .map(|row| {
            row.into_pairs()
                .map(|(column, value)| (column, normalize(&value, options)))
                .collect()
        })
        .collect();

    tracing::debug!(rows = documents.len(), "table exported");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("orders"), "\"orders\"");
        assert_eq!(quote_identifier("order items"), "\"order items\"");
        assert_eq!(quote_identifier("x\"; DROP TABLE y; --"), "\"x\"\"; DROP TABLE y; --\"");
    }
}
