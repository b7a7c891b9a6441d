//! docdump drivers - database driver implementations
//!
//! This crate bundles the concrete drivers behind cargo features and provides
//! [`DriverRegistry`] to pick one from a path or connection string.

#[cfg(feature = "sqlite")]
pub use docdump_driver_sqlite as sqlite;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from docdump-core
pub use docdump_core::{
    ColumnMeta, Connection, ConnectionConfig, DatabaseDriver, DocdumpError, QueryResult, Result,
    Row, SchemaIntrospection, StatementResult, Value,
};
