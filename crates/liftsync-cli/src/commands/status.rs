use serde::Serialize;

use crate::commands::common::{display_path, format_sync_timestamp, Context};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub owner_id: String,
    pub db_path: String,
    pub pending_uploads: usize,
    pub sync_enabled: bool,
    pub remote_url: Option<String>,
    pub last_upload_at: Option<i64>,
    pub last_download_at: Option<i64>,
}

pub async fn collect_status(ctx: &Context) -> Result<StatusReport, CliError> {
    let owner_id = ctx.owner()?;
    let store = ctx.open_store().await?;
    let state = store.sync_state(owner_id).await?;

    Ok(StatusReport {
        owner_id: owner_id.to_string(),
        db_path: display_path(store.path()),
        pending_uploads: store.count_dirty(owner_id).await?,
        sync_enabled: ctx.settings.sync_enabled(),
        remote_url: ctx.settings.remote_url.clone(),
        last_upload_at: state.last_upload_at,
        last_download_at: state.last_download_at,
    })
}

pub fn format_status_lines(status: &StatusReport) -> Vec<String> {
    let never = || "never".to_string();
    vec![
        format!("owner:           {}", status.owner_id),
        format!("database:        {}", status.db_path),
        format!("pending uploads: {}", status.pending_uploads),
        format!(
            "remote:          {}",
            status.remote_url.as_deref().unwrap_or("not configured")
        ),
        format!(
            "last upload:     {}",
            status.last_upload_at.map_or_else(never, format_sync_timestamp)
        ),
        format!(
            "last download:   {}",
            status.last_download_at.map_or_else(never, format_sync_timestamp)
        ),
    ]
}

pub async fn run_status(as_json: bool, ctx: &Context) -> Result<(), CliError> {
    let status = collect_status(ctx).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for line in format_status_lines(&status) {
            println!("{line}");
        }
    }
    Ok(())
}
