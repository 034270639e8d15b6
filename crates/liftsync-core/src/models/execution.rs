//! Workout execution model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::util::{normalize_text_option, now_millis};

/// A unique identifier for an execution, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Create a new unique execution ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ExecutionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// One completed workout session as held by the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Stable identifier shared with the remote copy
    pub id: ExecutionId,
    /// Workout that was performed
    pub workout_id: String,
    /// Denormalized workout label
    pub workout_name: String,
    /// Owning user
    pub owner_id: String,
    /// When the workout was performed (Unix ms)
    pub performed_at: i64,
    /// Free-text notes
    pub notes: Option<String>,
    /// Session length in seconds
    pub duration_seconds: u32,
    /// Whether the session was completed
    pub completed: bool,
    /// Local state not yet confirmed by the remote store
    pub dirty: bool,
    /// Last local mutation (Unix ms)
    pub updated_at: i64,
}

/// Input for the local workout-completion action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewExecution {
    pub workout_id: String,
    pub workout_name: String,
    pub owner_id: String,
    pub notes: Option<String>,
    pub duration_seconds: u32,
    /// Defaults to now when omitted
    pub performed_at: Option<i64>,
    /// Defaults to `true` when omitted
    pub completed: Option<bool>,
}

/// A local edit of an existing execution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionEdit {
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
    pub duration_seconds: Option<u32>,
    pub completed: Option<bool>,
}

impl ExecutionEdit {
    /// Check whether the edit changes anything
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.notes.is_none() && self.duration_seconds.is_none() && self.completed.is_none()
    }
}

impl ExecutionRecord {
    /// Create a freshly logged execution; it always starts dirty.
    pub fn new(input: NewExecution) -> Result<Self> {
        let workout_id = required(input.workout_id, "workout_id")?;
        let workout_name = required(input.workout_name, "workout_name")?;
        let owner_id = required(input.owner_id, "owner_id")?;

        let now = now_millis();
        Ok(Self {
            id: ExecutionId::new(),
            workout_id,
            workout_name,
            owner_id,
            performed_at: input.performed_at.unwrap_or(now),
            notes: normalize_text_option(input.notes),
            duration_seconds: input.duration_seconds,
            completed: input.completed.unwrap_or(true),
            dirty: true,
            updated_at: now,
        })
    }

    /// Apply a local edit, marking the record dirty.
    pub fn apply_edit(&mut self, edit: &ExecutionEdit) {
        if let Some(notes) = &edit.notes {
            self.notes = normalize_text_option(notes.clone());
        }
        if let Some(duration) = edit.duration_seconds {
            self.duration_seconds = duration;
        }
        if let Some(completed) = edit.completed {
            self.completed = completed;
        }
        self.dirty = true;
        self.updated_at = now_millis();
    }

    /// Duration formatted as `h:mm:ss` or `m:ss`
    #[must_use]
    pub fn duration_label(&self) -> String {
        let hours = self.duration_seconds / 3600;
        let minutes = (self.duration_seconds % 3600) / 60;
        let seconds = self.duration_seconds % 60;
        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

fn required(value: String, field: &str) -> Result<String> {
    normalize_text_option(Some(value))
        .ok_or_else(|| Error::InvalidInput(format!("{field} must not be empty")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> NewExecution {
        NewExecution {
            workout_id: "w-legs".to_string(),
            workout_name: "Leg day".to_string(),
            owner_id: "u1".to_string(),
            notes: Some("  felt strong ".to_string()),
            duration_seconds: 600,
            ..NewExecution::default()
        }
    }

    #[test]
    fn test_execution_id_unique() {
        assert_ne!(ExecutionId::new(), ExecutionId::new());
    }

    #[test]
    fn test_execution_id_parse() {
        let id = ExecutionId::new();
        let parsed: ExecutionId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<ExecutionId>().is_err());
    }

    #[test]
    fn new_execution_starts_dirty() {
        let record = ExecutionRecord::new(sample_input()).unwrap();
        assert!(record.dirty);
        assert!(record.completed);
        assert_eq!(record.notes.as_deref(), Some("felt strong"));
        assert_eq!(record.performed_at, record.updated_at);
    }

    #[test]
    fn new_execution_requires_owner_and_workout() {
        let mut input = sample_input();
        input.owner_id = "   ".to_string();
        assert!(matches!(
            ExecutionRecord::new(input),
            Err(Error::InvalidInput(message)) if message.contains("owner_id")
        ));

        let mut input = sample_input();
        input.workout_id = String::new();
        assert!(ExecutionRecord::new(input).is_err());
    }

    #[test]
    fn apply_edit_marks_dirty() {
        let mut record = ExecutionRecord::new(sample_input()).unwrap();
        record.dirty = false;

        record.apply_edit(&ExecutionEdit {
            notes: Some(None),
            duration_seconds: Some(900),
            completed: None,
        });

        assert!(record.dirty);
        assert_eq!(record.notes, None);
        assert_eq!(record.duration_seconds, 900);
    }

    #[test]
    fn test_duration_label() {
        let mut record = ExecutionRecord::new(sample_input()).unwrap();
        assert_eq!(record.duration_label(), "10:00");
        record.duration_seconds = 3_725;
        assert_eq!(record.duration_label(), "1:02:05");
    }
}
