//! Process-local remote store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RemoteError, RemoteResult, RemoteStore};
use crate::models::RemoteExecution;
use crate::util::now_millis;

#[derive(Debug, Default)]
struct Documents {
    by_id: HashMap<String, RemoteExecution>,
    put_faults: HashMap<String, RemoteError>,
    query_fault: Option<RemoteError>,
    put_count: usize,
}

/// Remote store backed by a map in memory.
///
/// Clones share the same documents. Faults can be injected per document id
/// (for `put`) or globally (for `query_by_owner`) and stay armed until cleared.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteStore {
    inner: Arc<Mutex<Documents>>,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` of `id` fail with `error`.
    pub async fn fail_put(&self, id: impl Into<String>, error: RemoteError) {
        self.inner.lock().await.put_faults.insert(id.into(), error);
    }

    pub async fn clear_put_fault(&self, id: &str) {
        self.inner.lock().await.put_faults.remove(id);
    }

    /// Make `query_by_owner` fail with `error`, or succeed again with `None`.
    pub async fn fail_queries(&self, error: Option<RemoteError>) {
        self.inner.lock().await.query_fault = error;
    }

    /// Write a document directly, as another device would.
    pub async fn insert_document(&self, mut document: RemoteExecution) {
        document.synced_at.get_or_insert_with(now_millis);
        self.inner
            .lock()
            .await
            .by_id
            .insert(document.id.clone(), document);
    }

    pub async fn get(&self, id: &str) -> Option<RemoteExecution> {
        self.inner.lock().await.by_id.get(id).cloned()
    }

    /// Number of stored documents across all owners
    pub async fn len(&self) -> usize {
        self.inner.lock().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of accepted `put` calls, including repeats
    pub async fn put_count(&self) -> usize {
        self.inner.lock().await.put_count
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn put(&self, record: &RemoteExecution) -> RemoteResult<()> {
        let mut documents = self.inner.lock().await;
        if let Some(error) = documents.put_faults.get(&record.id) {
            return Err(error.clone());
        }

        let mut stored = record.clone();
        stored.synced_at = Some(now_millis());
        documents.by_id.insert(stored.id.clone(), stored);
        documents.put_count += 1;
        Ok(())
    }

    async fn query_by_owner(&self, owner_id: &str) -> RemoteResult<Vec<RemoteExecution>> {
        let documents = self.inner.lock().await;
        if let Some(error) = &documents.query_fault {
            return Err(error.clone());
        }

        let mut owned: Vec<RemoteExecution> = documents
            .by_id
            .values()
            .filter(|document| document.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(owned)
    }
}
