//! Error types for secure storage.

use ariob_crypto::CryptoError;
use ariob_storage::StorageError;
use ariob_types::AppError;
use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// The session lapsed; writes are refused until a new session begins.
    #[error("session expired")]
    SessionExpired,

    /// A stored record failed its integrity check and was purged.
    #[error("integrity check failed for {0}")]
    Integrity(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::SessionExpired => AppError::auth("session expired"),
            VaultError::Integrity(key) => {
                AppError::validation("data integrity verification failed").with_cause(key)
            }
            VaultError::Crypto(e) => e.into(),
            VaultError::Storage(e) => e.into(),
            VaultError::Serialization(e) => {
                AppError::validation("stored data is malformed").with_cause(e)
            }
        }
    }
}
