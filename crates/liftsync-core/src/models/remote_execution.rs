//! Remote document shape of an execution

use serde::{Deserialize, Serialize};

use super::{ExecutionId, ExecutionRecord};
use crate::error::{Error, Result};
use crate::util::now_millis;

/// Execution as stored by the remote document store.
///
/// Carries no `dirty`/`updated_at`; `synced_at` is assigned by the server and
/// ignored on upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteExecution {
    pub id: String,
    pub workout_id: String,
    pub workout_name: String,
    pub owner_id: String,
    pub performed_at: i64,
    #[serde(default)]
    pub notes: Option<String>,
    pub duration_seconds: u32,
    #[serde(default = "default_completed")]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<i64>,
}

const fn default_completed() -> bool {
    true
}

impl From<&ExecutionRecord> for RemoteExecution {
    fn from(record: &ExecutionRecord) -> Self {
        Self {
            id: record.id.as_str(),
            workout_id: record.workout_id.clone(),
            workout_name: record.workout_name.clone(),
            owner_id: record.owner_id.clone(),
            performed_at: record.performed_at,
            notes: record.notes.clone(),
            duration_seconds: record.duration_seconds,
            completed: record.completed,
            synced_at: None,
        }
    }
}

impl RemoteExecution {
    /// Convert into a clean local record, as written by a download.
    pub fn into_local(self) -> Result<ExecutionRecord> {
        let id = self
            .id
            .parse::<ExecutionId>()
            .map_err(|_| Error::InvalidInput(format!("invalid execution id `{}`", self.id)))?;

        Ok(ExecutionRecord {
            id,
            workout_id: self.workout_id,
            workout_name: self.workout_name,
            owner_id: self.owner_id,
            performed_at: self.performed_at,
            notes: self.notes,
            duration_seconds: self.duration_seconds,
            completed: self.completed,
            dirty: false,
            updated_at: now_millis(),
        })
    }
}
