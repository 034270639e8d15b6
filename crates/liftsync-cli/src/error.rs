use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] liftsync_core::Error),
    #[error(transparent)]
    Config(#[from] liftsync_core::ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No owner configured. Pass --owner or set LIFTSYNC_OWNER_ID")]
    MissingOwner,
    #[error("Execution ID cannot be empty")]
    EmptyExecutionId,
    #[error("Execution not found for id/prefix: {0}")]
    ExecutionNotFound(String),
    #[error("{0}")]
    AmbiguousExecutionId(String),
    #[error("Nothing to change; pass --notes, --clear-notes, --duration or --completed")]
    EmptyEdit,
    #[error("Invalid timestamp `{0}`; expected RFC 3339 such as 2024-03-03T18:30:00Z")]
    InvalidTimestamp(String),
    #[error("Failed to resolve the local data directory; pass --db-path")]
    DataDirUnavailable,
    #[error("Sync is not configured. Set LIFTSYNC_REMOTE_URL to the sync service URL.")]
    SyncNotConfigured,
}
