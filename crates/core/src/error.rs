//! Error types for channel administration.
//!
//! Uses `thiserror` for ergonomic error definitions. Storage failures have
//! their own enum so backends don't depend on the top-level error.

use thiserror::Error;

/// The top-level error type for all keyrelay operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request errors ---
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Channel not found: {0}")]
    NotFound(i64),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Error::NotFound(id),
            other => Error::Store(other),
        }
    }
}

/// Errors raised by a `ChannelStore` implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("No channel with id {0}")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err: Error = StoreError::NotFound(42).into();
        assert!(matches!(err, Error::NotFound(42)));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn storage_error_displays_correctly() {
        let err: Error = StoreError::Storage("disk full".into()).into();
        assert!(matches!(err, Error::Store(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
