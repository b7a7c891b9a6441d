//! Schema introspection traits and types

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Catalog inspection interface
#[async_trait]
pub trait SchemaIntrospection: Send + Sync {
    /// List all user-visible tables, in the store's stable catalog order.
    ///
    /// Internal catalog tables are never returned. An empty store yields an
    /// empty list.
    async fn list_tables(&self, schema: Option<&str>) -> Result<Vec<TableInfo>>;

    /// Check whether a table exists
    async fn table_exists(&self, schema: Option<&str>, name: &str) -> Result<bool> {
        let tables = self.list_tables(schema).await?;
        Ok(tables.iter().any(|t| t.name == name))
    }
}

/// Table information (basic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub schema: Option<String>,
    pub name: String,
}

impl TableInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }
}
