//! Error types for liftsync-core

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using liftsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in liftsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local store unavailable or inconsistent
    #[error("Storage error: {0}")]
    Storage(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Execution record not found
    #[error("Execution not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote store fault that aborted a whole pass
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl Error {
    /// Whether this error means the local store itself failed.
    ///
    /// Storage faults are reported upward without any automatic retry.
    pub const fn is_storage_fault(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::LibSql(_) | Self::Io(_))
    }

    /// Whether re-invoking the failed operation later may succeed.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Remote(error) => error.is_retryable(),
            _ => false,
        }
    }
}
