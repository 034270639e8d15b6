//! Execution repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{ExecutionEdit, ExecutionId, ExecutionRecord, SyncKind, SyncState};
use libsql::{params, Connection, Row, Value};

const SELECT_COLUMNS: &str = "SELECT id, workout_id, workout_name, owner_id, performed_at, notes,
        duration_seconds, completed, dirty, updated_at
     FROM executions";

/// Trait for execution storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ExecutionRepository {
    /// Insert a locally created execution; it is always stored dirty
    async fn insert(&self, record: &ExecutionRecord) -> Result<()>;

    /// Get an execution by ID
    async fn get(&self, id: &ExecutionId) -> Result<Option<ExecutionRecord>>;

    /// List an owner's executions, most recently performed first
    async fn list(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ExecutionRecord>>;

    /// Snapshot of every dirty execution for an owner
    async fn query_dirty(&self, owner_id: &str) -> Result<Vec<ExecutionRecord>>;

    /// Number of dirty executions for an owner
    async fn count_dirty(&self, owner_id: &str) -> Result<usize>;

    /// Apply a local edit, marking the execution dirty
    async fn edit(&self, id: &ExecutionId, edit: &ExecutionEdit) -> Result<ExecutionRecord>;

    /// Clear the dirty flag of one execution
    async fn mark_clean(&self, id: &ExecutionId) -> Result<bool>;

    /// Clear the dirty flag only if no local mutation happened since `updated_at`
    async fn mark_clean_if_unchanged(&self, id: &ExecutionId, updated_at: i64) -> Result<bool>;

    /// Insert or overwrite an execution as clean
    async fn upsert(&self, record: &ExecutionRecord) -> Result<()>;

    /// Insert or overwrite a batch of executions as clean in one transaction
    async fn upsert_many(&self, records: &[ExecutionRecord]) -> Result<usize>;

    /// Load sync bookkeeping for an owner
    async fn sync_state(&self, owner_id: &str) -> Result<SyncState>;

    /// Remember when a pass of `kind` last succeeded for an owner
    async fn record_sync(&self, owner_id: &str, kind: SyncKind, at: i64) -> Result<()>;
}

/// libSQL implementation of `ExecutionRepository`
pub struct LibSqlExecutionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlExecutionRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Commit on success, roll back on failure
    async fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                if let Err(e) = self.conn.execute("COMMIT", ()).await {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                self.conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    async fn query_records(&self, sql: &str, params: Vec<Value>) -> Result<Vec<ExecutionRecord>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_execution(&row)?);
        }
        Ok(records)
    }

    async fn upsert_clean(&self, record: &ExecutionRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO executions (
                    id, workout_id, workout_name, owner_id, performed_at, notes,
                    duration_seconds, completed, dirty, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    workout_id = excluded.workout_id,
                    workout_name = excluded.workout_name,
                    owner_id = excluded.owner_id,
                    performed_at = excluded.performed_at,
                    notes = excluded.notes,
                    duration_seconds = excluded.duration_seconds,
                    completed = excluded.completed,
                    dirty = 0,
                    updated_at = excluded.updated_at",
                Self::record_params(record, false),
            )
            .await?;
        Ok(())
    }

    async fn edit_in_tx(&self, id: &ExecutionId, edit: &ExecutionEdit) -> Result<ExecutionRecord> {
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let previous_updated_at = record.updated_at;
        record.apply_edit(edit);
        // updated_at must move even for edits within the same millisecond
        record.updated_at = record.updated_at.max(previous_updated_at + 1);

        self.conn
            .execute(
                "UPDATE executions
                 SET notes = ?, duration_seconds = ?, completed = ?, dirty = 1, updated_at = ?
                 WHERE id = ?",
                params![
                    text_or_null(record.notes.as_deref()),
                    i64::from(record.duration_seconds),
                    i64::from(record.completed),
                    record.updated_at,
                    id.as_str()
                ],
            )
            .await?;

        Ok(record)
    }

    async fn upsert_all_in_tx(&self, records: &[ExecutionRecord]) -> Result<usize> {
        for record in records {
            self.upsert_clean(record).await?;
        }
        Ok(records.len())
    }

    fn record_params(record: &ExecutionRecord, dirty: bool) -> Vec<Value> {
        vec![
            Value::Text(record.id.as_str()),
            Value::Text(record.workout_id.clone()),
            Value::Text(record.workout_name.clone()),
            Value::Text(record.owner_id.clone()),
            Value::Integer(record.performed_at),
            text_or_null(record.notes.as_deref()),
            Value::Integer(i64::from(record.duration_seconds)),
            Value::Integer(i64::from(record.completed)),
            Value::Integer(i64::from(dirty)),
            Value::Integer(record.updated_at),
        ]
    }

    /// Parse an execution from a database row
    fn parse_execution(row: &Row) -> Result<ExecutionRecord> {
        let raw_id: String = row.get(0)?;
        let id: ExecutionId = raw_id
            .parse()
            .map_err(|_| Error::Storage(format!("corrupt execution id `{raw_id}`")))?;

        let notes = match row.get_value(5)? {
            Value::Text(notes) => Some(notes),
            _ => None,
        };

        let duration: i64 = row.get(6)?;
        let duration_seconds = u32::try_from(duration)
            .map_err(|_| Error::Storage(format!("corrupt duration {duration} for {id}")))?;

        Ok(ExecutionRecord {
            id,
            workout_id: row.get(1)?,
            workout_name: row.get(2)?,
            owner_id: row.get(3)?,
            performed_at: row.get(4)?,
            notes,
            duration_seconds,
            completed: row.get::<i64>(7)? != 0,
            dirty: row.get::<i64>(8)? != 0,
            updated_at: row.get(9)?,
        })
    }
}

fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

impl ExecutionRepository for LibSqlExecutionRepository<'_> {
    async fn insert(&self, record: &ExecutionRecord) -> Result<()> {
        // dirty is forced on for local creation
        self.conn
            .execute(
                "INSERT INTO executions (
                    id, workout_id, workout_name, owner_id, performed_at, notes,
                    duration_seconds, completed, dirty, updated_at
                 ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                Self::record_params(record, true),
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &ExecutionId) -> Result<Option<ExecutionRecord>> {
        let records = self
            .query_records(
                &format!("{SELECT_COLUMNS} WHERE id = ?"),
                vec![Value::Text(id.as_str())],
            )
            .await?;
        Ok(records.into_iter().next())
    }

    async fn list(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ExecutionRecord>> {
        self.query_records(
            &format!(
                "{SELECT_COLUMNS}
                 WHERE owner_id = ?
                 ORDER BY performed_at DESC, id DESC
                 LIMIT ? OFFSET ?"
            ),
            vec![
                Value::Text(owner_id.to_string()),
                Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)),
                Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)),
            ],
        )
        .await
    }

    async fn query_dirty(&self, owner_id: &str) -> Result<Vec<ExecutionRecord>> {
        // Rows are copied into owned values; nothing refers back to the connection
        self.query_records(
            &format!(
                "{SELECT_COLUMNS}
                 WHERE owner_id = ? AND dirty = 1
                 ORDER BY updated_at ASC, id ASC"
            ),
            vec![Value::Text(owner_id.to_string())],
        )
        .await
    }

    async fn count_dirty(&self, owner_id: &str) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM executions WHERE owner_id = ? AND dirty = 1",
                [owner_id],
            )
            .await?;

        let count: i64 = if let Some(row) = rows.next().await? {
            row.get(0)?
        } else {
            0
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn edit(&self, id: &ExecutionId, edit: &ExecutionEdit) -> Result<ExecutionRecord> {
        if edit.is_empty() {
            return Err(Error::InvalidInput("edit does not change anything".into()));
        }

        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = self.edit_in_tx(id, edit).await;
        self.finish(result).await
    }

    async fn mark_clean(&self, id: &ExecutionId) -> Result<bool> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = self
            .conn
            .execute(
                "UPDATE executions SET dirty = 0 WHERE id = ? AND dirty = 1",
                [id.as_str()],
            )
            .await
            .map_err(Error::from);
        let changed = self.finish(result).await?;
        Ok(changed > 0)
    }

    async fn mark_clean_if_unchanged(&self, id: &ExecutionId, updated_at: i64) -> Result<bool> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = self
            .conn
            .execute(
                "UPDATE executions SET dirty = 0
                 WHERE id = ? AND dirty = 1 AND updated_at = ?",
                params![id.as_str(), updated_at],
            )
            .await
            .map_err(Error::from);
        let changed = self.finish(result).await?;
        Ok(changed > 0)
    }

    async fn upsert(&self, record: &ExecutionRecord) -> Result<()> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = self.upsert_clean(record).await;
        self.finish(result).await
    }

    async fn upsert_many(&self, records: &[ExecutionRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        let result = self.upsert_all_in_tx(records).await;
        self.finish(result).await
    }

    async fn sync_state(&self, owner_id: &str) -> Result<SyncState> {
        let mut rows = self
            .conn
            .query(
                "SELECT last_upload_at, last_download_at FROM sync_state WHERE owner_id = ?",
                [owner_id],
            )
            .await?;

        let mut state = SyncState {
            owner_id: owner_id.to_string(),
            ..SyncState::default()
        };
        if let Some(row) = rows.next().await? {
            state.last_upload_at = optional_integer(row.get_value(0)?);
            state.last_download_at = optional_integer(row.get_value(1)?);
        }
        Ok(state)
    }

    async fn record_sync(&self, owner_id: &str, kind: SyncKind, at: i64) -> Result<()> {
        let sql = match kind {
            SyncKind::Upload => {
                "INSERT INTO sync_state (owner_id, last_upload_at) VALUES (?, ?)
                 ON CONFLICT(owner_id) DO UPDATE SET last_upload_at = excluded.last_upload_at"
            }
            SyncKind::Download => {
                "INSERT INTO sync_state (owner_id, last_download_at) VALUES (?, ?)
                 ON CONFLICT(owner_id) DO UPDATE SET last_download_at = excluded.last_download_at"
            }
        };
        self.conn.execute(sql, params![owner_id, at]).await?;
        Ok(())
    }
}

fn optional_integer(value: Value) -> Option<i64> {
    match value {
        Value::Integer(value) => Some(value),
        _ => None,
    }
}
