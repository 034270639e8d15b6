//! Shared local store service used by the sync engine and clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::db::{Database, ExecutionRepository, LibSqlExecutionRepository};
use crate::models::{
    ExecutionEdit, ExecutionId, ExecutionRecord, NewExecution, SyncKind, SyncState,
};
use crate::Result;

/// Cloneable handle over the local execution database.
///
/// Every operation opens its own connection, so handles can be moved into
/// background tasks freely and never share a connection for writes.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl LocalStore {
    /// Open (or create) the store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let db = Database::open(&db_path).await?;
        tracing::debug!("Opened local store at {}", db_path.display());
        Ok(Self { db: Arc::new(db) })
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Record a completed workout locally. The new record is dirty.
    pub async fn log(&self, input: NewExecution) -> Result<ExecutionRecord> {
        let record = ExecutionRecord::new(input)?;
        self.insert(&record).await?;
        Ok(record)
    }

    pub async fn insert(&self, record: &ExecutionRecord) -> Result<()> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn).insert(record).await
    }

    pub async fn get(&self, id: &ExecutionId) -> Result<Option<ExecutionRecord>> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn).get(id).await
    }

    /// List an owner's executions newest-first.
    pub async fn list(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ExecutionRecord>> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .list(owner_id, limit, offset)
            .await
    }

    /// Every execution of an owner, newest-first.
    pub async fn list_all(&self, owner_id: &str) -> Result<Vec<ExecutionRecord>> {
        self.list(owner_id, usize::MAX, 0).await
    }

    /// Owned snapshot of the owner's dirty executions.
    pub async fn query_dirty(&self, owner_id: &str) -> Result<Vec<ExecutionRecord>> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .query_dirty(owner_id)
            .await
    }

    pub async fn count_dirty(&self, owner_id: &str) -> Result<usize> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .count_dirty(owner_id)
            .await
    }

    /// Apply a local edit; the record becomes dirty again.
    pub async fn edit(&self, id: &ExecutionId, edit: &ExecutionEdit) -> Result<ExecutionRecord> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn).edit(id, edit).await
    }

    pub async fn mark_clean(&self, id: &ExecutionId) -> Result<bool> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn).mark_clean(id).await
    }

    /// Clear the dirty flag only if the record was not edited after `updated_at`.
    pub async fn mark_clean_if_unchanged(&self, id: &ExecutionId, updated_at: i64) -> Result<bool> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .mark_clean_if_unchanged(id, updated_at)
            .await
    }

    pub async fn upsert(&self, record: &ExecutionRecord) -> Result<()> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn).upsert(record).await
    }

    /// Upsert a batch of clean records in one transaction.
    pub async fn upsert_many(&self, records: &[ExecutionRecord]) -> Result<usize> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .upsert_many(records)
            .await
    }

    pub async fn sync_state(&self, owner_id: &str) -> Result<SyncState> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .sync_state(owner_id)
            .await
    }

    pub async fn record_sync(&self, owner_id: &str, kind: SyncKind, at: i64) -> Result<()> {
        let conn = self.db.connect().await?;
        LibSqlExecutionRepository::new(&conn)
            .record_sync(owner_id, kind, at)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn input(owner: &str, performed_at: i64) -> NewExecution {
        NewExecution {
            workout_id: "w-pull".to_string(),
            workout_name: "Pull day".to_string(),
            owner_id: owner.to_string(),
            duration_seconds: 1_200,
            performed_at: Some(performed_at),
            ..NewExecution::default()
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn log_then_list_all_newest_first() {
        let tmp = tempdir().unwrap();
        let store = LocalStore::open_path(tmp.path().join("liftsync.db"))
            .await
            .unwrap();

        let older = store.log(input("u1", 1_000)).await.unwrap();
        let newer = store.log(input("u1", 2_000)).await.unwrap();
        store.log(input("u2", 3_000)).await.unwrap();

        let ids: Vec<ExecutionId> = store
            .list_all("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(store.count_dirty("u1").await.unwrap(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clones_see_each_others_writes() {
        let tmp = tempdir().unwrap();
        let store = LocalStore::open_path(tmp.path().join("liftsync.db"))
            .await
            .unwrap();
        let worker = store.clone();

        let record = store.log(input("u1", 1_000)).await.unwrap();
        let handle = tokio::spawn(async move { worker.mark_clean(&record.id).await });
        assert!(handle.await.unwrap().unwrap());

        assert_eq!(store.count_dirty("u1").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn open_fails_on_unusable_path() {
        let tmp = tempdir().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let error = LocalStore::open_path(blocker.join("liftsync.db"))
            .await
            .err()
            .unwrap();
        assert!(error.is_storage_fault());
    }
}
