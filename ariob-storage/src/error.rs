//! Error types for the storage layer.

use ariob_types::AppError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes are not valid for the requested type.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::Serialization(_) | StorageError::InvalidData(_) => {
                AppError::validation("stored data is malformed").with_cause(err)
            }
            StorageError::Io(_) | StorageError::Poisoned => {
                AppError::storage("platform storage failed").with_cause(err)
            }
        }
    }
}
