//! Error types for the account layer.

use ariob_types::AppError;
use thiserror::Error;

/// Result type for account operations.
pub type AccountResult<T> = Result<T, AccountError>;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("account already exists: {0}")]
    AlreadyExists(String),

    /// Metadata exists but the encrypted key pair does not (purged or never
    /// stored).
    #[error("credentials missing for account {0}")]
    MissingCredentials(String),

    #[error("no profile for {0}")]
    ProfileNotFound(String),

    #[error("invalid mnemonic phrase")]
    InvalidMnemonic,

    /// The auth request lacks what this method needs.
    #[error("incomplete auth request: {0}")]
    IncompleteRequest(&'static str),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match &err {
            AccountError::NotFound(_) => AppError::not_found("account not found"),
            AccountError::AlreadyExists(_) => AppError::validation("account already exists"),
            AccountError::MissingCredentials(_) => {
                AppError::validation("account credentials not found")
            }
            AccountError::ProfileNotFound(_) => AppError::not_found("profile not found"),
            AccountError::InvalidMnemonic => AppError::validation("invalid mnemonic phrase"),
            AccountError::IncompleteRequest(_) => AppError::validation("invalid auth request"),
        }
        .with_cause(err)
    }
}
