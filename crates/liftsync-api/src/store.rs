//! Execution documents kept by the service, one libSQL table keyed by id.

use std::path::{Path, PathBuf};
use std::time::Duration;

use libsql::{params, Builder, Connection, Database, Row, Value};
use liftsync_core::RemoteExecution;
use serde::Serialize;
use thiserror::Error;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COLUMNS: &str = "id, workout_id, workout_name, owner_id, performed_at, notes, \
                       duration_seconds, completed, synced_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("execution {id} belongs to another owner")]
    OwnerMismatch { id: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Database error: {0}")]
    LibSql(#[from] libsql::Error),
}

/// One page of an owner's documents, ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPage {
    pub items: Vec<RemoteExecution>,
    /// Id to pass as `cursor` for the next page; `None` on the last page
    pub next_cursor: Option<String>,
}

pub struct DocumentStore {
    db: Database,
    path: PathBuf,
}

impl DocumentStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|error| {
                StoreError::Storage(format!("failed to create {}: {error}", parent.display()))
            })?;
        }

        let db = Builder::new_local(&path)
            .build()
            .await
            .map_err(|error| {
                StoreError::Storage(format!("failed to open {}: {error}", path.display()))
            })?;

        let store = Self { db, path };
        let conn = store.connect().await?;
        conn.query("PRAGMA journal_mode = WAL;", ()).await.ok();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS remote_executions (
                id TEXT PRIMARY KEY NOT NULL,
                workout_id TEXT NOT NULL,
                workout_name TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                performed_at INTEGER NOT NULL,
                notes TEXT,
                duration_seconds INTEGER NOT NULL,
                completed INTEGER NOT NULL DEFAULT 1,
                synced_at INTEGER NOT NULL
            )",
            (),
        )
        .await?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_remote_executions_owner
             ON remote_executions(owner_id, id)",
            (),
        )
        .await?;

        tracing::info!(path = %store.path.display(), "Document store ready");
        Ok(store)
    }

    async fn connect(&self) -> Result<Connection, StoreError> {
        let conn = self.db.connect()?;
        conn.query(
            &format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT.as_millis()),
            (),
        )
        .await?;
        Ok(conn)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or replace a document and stamp `synced_at`.
    ///
    /// An id already stored under another owner is refused.
    pub async fn put(&self, document: &RemoteExecution) -> Result<RemoteExecution, StoreError> {
        let conn = self.connect().await?;
        conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = Self::put_in_tx(&conn, document).await;
        finish(&conn, result).await
    }

    async fn put_in_tx(
        conn: &Connection,
        document: &RemoteExecution,
    ) -> Result<RemoteExecution, StoreError> {
        let existing_owner = {
            let mut rows = conn
                .query(
                    "SELECT owner_id FROM remote_executions WHERE id = ?",
                    params![document.id.as_str()],
                )
                .await?;
            match rows.next().await? {
                Some(row) => Some(row.get::<String>(0)?),
                None => None,
            }
        };
        if existing_owner.is_some_and(|owner| owner != document.owner_id) {
            return Err(StoreError::OwnerMismatch {
                id: document.id.clone(),
            });
        }

        let mut stored = document.clone();
        stored.synced_at = Some(chrono::Utc::now().timestamp_millis());

        conn.execute(
            "INSERT INTO remote_executions (
                id, workout_id, workout_name, owner_id, performed_at, notes,
                duration_seconds, completed, synced_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                workout_id = excluded.workout_id,
                workout_name = excluded.workout_name,
                performed_at = excluded.performed_at,
                notes = excluded.notes,
                duration_seconds = excluded.duration_seconds,
                completed = excluded.completed,
                synced_at = excluded.synced_at",
            vec![
                Value::Text(stored.id.clone()),
                Value::Text(stored.workout_id.clone()),
                Value::Text(stored.workout_name.clone()),
                Value::Text(stored.owner_id.clone()),
                Value::Integer(stored.performed_at),
                stored.notes.clone().map_or(Value::Null, Value::Text),
                Value::Integer(i64::from(stored.duration_seconds)),
                Value::Integer(i64::from(stored.completed)),
                stored.synced_at.map_or(Value::Null, Value::Integer),
            ],
        )
        .await?;

        Ok(stored)
    }

    pub async fn get(&self, id: &str) -> Result<Option<RemoteExecution>, StoreError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {COLUMNS} FROM remote_executions WHERE id = ?"),
                params![id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_document(&row)?)),
            None => Ok(None),
        }
    }

    /// Documents of `owner_id` with ids after `cursor`.
    pub async fn page(
        &self,
        owner_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ExecutionPage, StoreError> {
        let limit = limit.max(1);
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {COLUMNS} FROM remote_executions
                     WHERE owner_id = ? AND id > ?
                     ORDER BY id ASC
                     LIMIT ?"
                ),
                params![owner_id, cursor.unwrap_or_default(), i64::from(limit) + 1],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(parse_document(&row)?);
        }

        let page_len = usize::try_from(limit).unwrap_or(usize::MAX);
        let next_cursor = if items.len() > page_len {
            items.truncate(page_len);
            items.last().map(|item| item.id.clone())
        } else {
            None
        };

        Ok(ExecutionPage { items, next_cursor })
    }
}

async fn finish<T>(conn: &Connection, result: Result<T, StoreError>) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            if let Err(error) = conn.execute("COMMIT", ()).await {
                conn.execute("ROLLBACK", ()).await.ok();
                return Err(error.into());
            }
            Ok(value)
        }
        Err(error) => {
            conn.execute("ROLLBACK", ()).await.ok();
            Err(error)
        }
    }
}

fn parse_document(row: &Row) -> Result<RemoteExecution, StoreError> {
    let id: String = row.get(0)?;
    let notes = match row.get_value(5)? {
        Value::Text(notes) => Some(notes),
        _ => None,
    };
    let duration: i64 = row.get(6)?;
    let duration_seconds = u32::try_from(duration)
        .map_err(|_| StoreError::Storage(format!("corrupt duration {duration} for {id}")))?;

    Ok(RemoteExecution {
        workout_id: row.get(1)?,
        workout_name: row.get(2)?,
        owner_id: row.get(3)?,
        performed_at: row.get(4)?,
        notes,
        duration_seconds,
        completed: row.get::<i64>(7)? != 0,
        synced_at: Some(row.get(8)?),
        id,
    })
}
