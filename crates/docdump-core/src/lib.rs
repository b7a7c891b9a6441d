//! docdump core - store-agnostic abstractions for the exporter
//!
//! This crate provides the fundamental traits and types that the driver and
//! export crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for an open handle to one database
//! - `SchemaIntrospection` - Trait for catalog inspection
//! - Common types like `Value`, `Row`, `ColumnMeta` and `QueryResult`

mod connection;
mod driver;
mod error;
mod schema;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use schema::*;
pub use types::*;
