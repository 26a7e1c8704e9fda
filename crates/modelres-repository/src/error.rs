//! Error types for the store layer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A lookup or ordering names a field the record type does not have
    #[error("Cannot resolve keyword '{field}' into field")]
    UnknownField { field: String },

    /// A value is not acceptable for its field
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A write would violate a uniqueness or key constraint
    #[error("{0}")]
    Integrity(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Fixture file has an unsupported extension
    #[error("Unsupported fixture format: {path}")]
    UnsupportedFixture { path: PathBuf },

    /// Database error (when database feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Any other backend failure
    #[error("Store error: {0}")]
    Backend(String),
}

impl From<modelres_core::CoreError> for StoreError {
    fn from(err: modelres_core::CoreError) -> Self {
        match err {
            modelres_core::CoreError::InvalidValue { field, message } => {
                StoreError::InvalidValue { field, message }
            }
            modelres_core::CoreError::FieldNotFound(field) => StoreError::UnknownField { field },
            other => StoreError::Backend(other.to_string()),
        }
    }
}
