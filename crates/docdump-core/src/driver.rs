//! Drivers and connection settings

use crate::{Connection, DocdumpError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A database backend that can open connections
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Stable identifier used in logs and the registry; defaults to [`name`](Self::name)
    fn id(&self) -> &'static str {
        self.name()
    }

    fn name(&self) -> &'static str;

    /// URL schemes accepted by [`parse_connection_string`](Self::parse_connection_string)
    fn schemes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Open a connection. Failing to reach the store is a `Connection` error,
    /// missing settings a `Configuration` error.
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    fn parse_connection_string(&self, _conn_str: &str) -> Result<ConnectionConfig> {
        Err(DocdumpError::Configuration(format!(
            "the {} driver does not accept connection strings",
            self.name()
        )))
    }
}

/// Settings for one connection
///
/// Driver specific options live in `params` as strings; drivers read them
/// with [`get_string`](Self::get_string) and [`get_bool`](Self::get_bool).
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Driver the settings are meant for
    pub driver: String,
    /// Database name or file path
    pub database: Option<String>,
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            ..Default::default()
        }
    }

    /// Settings for a SQLite file (or `:memory:`)
    pub fn new_sqlite(path: &str) -> Self {
        Self {
            database: Some(path.to_string()),
            ..Self::new("sqlite")
        }
    }

    /// Set a parameter; non-string JSON scalars are stored in their JSON text form
    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        let text = match value.into() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        self.params.insert(key.to_string(), text);
        self
    }

    /// Look up a parameter. `path` and `database` fall back to [`database`](Self::database).
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.params.get(key).cloned().or_else(|| match key {
            "database" | "path" => self.database.clone(),
            _ => None,
        })
    }

    /// `true`, `1`, `yes` and `on` (any case) are true; anything else, or a
    /// missing key, is false
    pub fn get_bool(&self, key: &str) -> bool {
        self.params
            .get(key)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
    }
}
