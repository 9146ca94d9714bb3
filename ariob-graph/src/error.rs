//! Error types for the graph layer.

use ariob_types::AppError;
use thiserror::Error;

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors reported by the graph store or its user system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A write acknowledgment carried an error.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The store could not be reached.
    #[error("graph unreachable: {0}")]
    Unreachable(String),

    /// Authentication failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// No response within the allotted time.
    #[error("operation timed out")]
    Timeout,

    /// The responding side went away before answering.
    #[error("channel closed")]
    ChannelClosed,
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match &err {
            GraphError::Rejected(_) => AppError::storage("graph store rejected the write"),
            GraphError::Auth(_) => AppError::auth("authentication failed"),
            GraphError::Unreachable(_) | GraphError::Timeout | GraphError::ChannelClosed => {
                AppError::network("graph store unavailable")
            }
        }
        .with_cause(err)
    }
}
