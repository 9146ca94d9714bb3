//! Error types for the cryptographic suite.

use ariob_types::AppError;
use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Key material could not be decoded or does not belong together.
    #[error("invalid key pair: {0}")]
    InvalidKeyPair(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        let message = match &err {
            CryptoError::Decryption(_) => "failed to decrypt data",
            CryptoError::Encryption(_) => "failed to encrypt data",
            CryptoError::KeyDerivation(_) => "failed to derive key",
            CryptoError::InvalidKeyLength { .. } | CryptoError::InvalidKeyPair(_) => {
                "invalid key material"
            }
            CryptoError::Serialization(_) => "malformed encrypted payload",
        };
        let base = match &err {
            CryptoError::Decryption(_)
            | CryptoError::InvalidKeyLength { .. }
            | CryptoError::InvalidKeyPair(_)
            | CryptoError::Serialization(_) => AppError::validation(message),
            CryptoError::Encryption(_) | CryptoError::KeyDerivation(_) => {
                AppError::unknown(message)
            }
        };
        base.with_cause(err)
    }
}
