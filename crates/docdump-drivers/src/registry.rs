//! Driver registry for managing available database drivers

use docdump_core::{ConnectionConfig, DatabaseDriver, DocdumpError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Driver used for inputs that carry no scheme (plain file paths, `:memory:`)
const FILE_DRIVER: &str = "sqlite";

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register a new driver
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        tracing::debug!(driver = %name, "registering database driver");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Resolve a path or connection string to a driver and its configuration.
    ///
    /// Accepted forms are `<scheme>://...`, `<scheme>:...` for a registered
    /// scheme, and bare file paths (including `:memory:`), which go to the
    /// SQLite driver.
    pub fn resolve(&self, input: &str) -> Result<(Arc<dyn DatabaseDriver>, ConnectionConfig)> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DocdumpError::Configuration(
                "No database path or connection string given".into(),
            ));
        }

        if let Some((scheme, _)) = input.split_once(':')
            && let Some(driver) = self.driver_for_scheme(scheme)
        {
            let config = driver.parse_connection_string(input)?;
            tracing::debug!(driver = driver.name(), "resolved connection string by scheme");
            return Ok((driver, config));
        }

        if let Some((scheme, _)) = input.split_once("://") {
            return Err(DocdumpError::Configuration(format!(
                "No driver registered for scheme '{}' (available: {})",
                scheme,
                self.list().join(", ")
            )));
        }

        let driver = self.drivers.get(FILE_DRIVER).cloned().ok_or_else(|| {
            DocdumpError::Configuration(format!(
                "'{}' looks like a file path but the {} driver is not available",
                input, FILE_DRIVER
            ))
        })?;
        let config = driver.parse_connection_string(input)?;
        Ok((driver, config))
    }

    fn driver_for_scheme(&self, scheme: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let scheme = scheme.to_ascii_lowercase();
        self.drivers
            .values()
            .find(|driver| driver.schemes().contains(&scheme.as_str()))
            .cloned()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
