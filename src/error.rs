//! Error types for the generator

use thiserror::Error;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GenError>;

/// Generator errors
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid metadata for {collection}: {reason}")]
    InvalidMetadata { collection: String, reason: String },

    #[error("Output path escapes the output root: {0}")]
    InvalidOutputPath(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
