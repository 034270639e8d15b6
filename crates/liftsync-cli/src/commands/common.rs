use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use liftsync_core::{
    ExecutionId, ExecutionRecord, HttpRemoteStore, LocalStore, SyncEngine, SyncReport,
    SyncSettings,
};
use serde::Serialize;

use crate::error::CliError;

/// Resolved global options shared by every command.
pub struct Context {
    pub db_path: PathBuf,
    pub owner: Option<String>,
    pub settings: SyncSettings,
}

impl Context {
    pub fn owner(&self) -> Result<&str, CliError> {
        self.owner
            .as_deref()
            .map(str::trim)
            .filter(|owner| !owner.is_empty())
            .ok_or(CliError::MissingOwner)
    }

    pub async fn open_store(&self) -> Result<LocalStore, CliError> {
        Ok(LocalStore::open_path(&self.db_path).await?)
    }

    /// Engine over the configured remote, or `None` in local-only mode.
    pub fn engine(&self, store: &LocalStore) -> Result<Option<Arc<SyncEngine>>, CliError> {
        let Some(remote_config) = self.settings.remote_config() else {
            return Ok(None);
        };
        let remote = HttpRemoteStore::new(remote_config)?;
        Ok(Some(Arc::new(SyncEngine::new(store.clone(), Arc::new(remote)))))
    }
}

#[derive(Debug, Serialize)]
pub struct ExecutionListItem {
    pub id: String,
    pub workout_id: String,
    pub workout_name: String,
    pub performed_at: i64,
    pub performed_at_iso: String,
    pub duration_seconds: u32,
    pub completed: bool,
    pub notes: Option<String>,
    pub pending: bool,
}

pub fn execution_to_list_item(record: &ExecutionRecord) -> ExecutionListItem {
    ExecutionListItem {
        id: record.id.to_string(),
        workout_id: record.workout_id.clone(),
        workout_name: record.workout_name.clone(),
        performed_at: record.performed_at,
        performed_at_iso: format_sync_timestamp(record.performed_at),
        duration_seconds: record.duration_seconds,
        completed: record.completed,
        notes: record.notes.clone(),
        pending: record.dirty,
    }
}

pub fn format_execution_lines(records: &[ExecutionRecord]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    records
        .iter()
        .map(|record| {
            let id = record.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let name = preview(&record.workout_name, 24);
            let duration = record.duration_label();
            let relative_time = format_relative_time(record.performed_at, now_ms);
            let marker = if record.dirty { "*" } else { " " };

            format!("{marker} {short_id:<13}  {name:<24}  {duration:>8}  {relative_time}")
        })
        .collect()
}

pub fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_report(report: &SyncReport) -> String {
    let mut line = format!(
        "{}: {}/{} ok",
        report.kind, report.succeeded, report.attempted
    );
    if report.is_clean() {
        return line;
    }
    if report.skipped > 0 {
        line.push_str(&format!(", {} skipped", report.skipped));
    }
    if report.network_faults() > 0 {
        line.push_str(&format!(", {} deferred (offline)", report.network_faults()));
    }
    if report.rejected() > 0 {
        line.push_str(&format!(", {} rejected", report.rejected()));
    }
    if report.clean_failures > 0 {
        line.push_str(&format!(", {} awaiting confirmation", report.clean_failures));
    }
    line
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
            || timestamp_ms.to_string(),
            |date_time| date_time.format("%Y-%m-%d").to_string(),
        )
    }
}

pub fn normalize_execution_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyExecutionId);
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Find an owned execution by full id or unique id prefix.
pub async fn resolve_execution(
    query: &str,
    owner_id: &str,
    store: &LocalStore,
) -> Result<ExecutionRecord, CliError> {
    let query = normalize_execution_identifier(query)?;

    if let Ok(id) = query.parse::<ExecutionId>() {
        if let Some(record) = store.get(&id).await? {
            if record.owner_id == owner_id {
                return Ok(record);
            }
        }
    }

    let mut matches = store
        .list_all(owner_id)
        .await?
        .into_iter()
        .filter(|record| record.id.to_string().starts_with(&query))
        .collect::<Vec<_>>();

    match matches.len() {
        0 => Err(CliError::ExecutionNotFound(query)),
        1 => Ok(matches.remove(0)),
        _ => {
            let options = matches
                .iter()
                .take(3)
                .map(|record| record.id.to_string().chars().take(13).collect::<String>())
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousExecutionId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    match cli_db_path {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("liftsync").join("liftsync.db"))
        .ok_or(CliError::DataDirUnavailable)
}

pub fn display_path(path: &Path) -> String {
    path.display().to_string()
}
