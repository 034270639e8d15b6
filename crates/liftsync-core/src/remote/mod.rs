//! Remote document store contract and adapters.

mod http;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RemoteExecution;

pub use http::{HttpRemoteStore, HttpRemoteStoreConfig};
pub use memory::InMemoryRemoteStore;

/// Faults reported by a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Transient unavailability; a later pass may succeed
    #[error("Remote store unreachable: {0}")]
    Network(String),
    /// The remote store refused the request
    #[error("Remote store rejected request: {0}")]
    Rejected(String),
}

impl RemoteError {
    /// Whether the same request may succeed when re-invoked later.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Network document store holding executions keyed by id.
///
/// Implementations must make `put` idempotent: writing the same document twice
/// leaves one document behind.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert or replace the document with `record.id`.
    async fn put(&self, record: &RemoteExecution) -> RemoteResult<()>;

    /// Every document whose `owner_id` equals `owner_id`.
    async fn query_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<RemoteExecution>>;
}
