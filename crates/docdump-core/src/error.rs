//! Error types for docdump

use thiserror::Error;

/// Core error type for store operations
#[derive(Error, Debug)]
pub enum DocdumpError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl DocdumpError {
    /// Whether the error means the connection itself is unusable
    pub fn is_connection(&self) -> bool {
        matches!(self, DocdumpError::Connection(_))
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, DocdumpError>;
