use liftsync_core::{NewExecution, SyncOutcome, SyncTrigger};

use crate::commands::common::{format_report, Context};
use crate::error::CliError;

pub struct LogArgs {
    pub workout_id: String,
    pub name: String,
    pub duration: u32,
    pub notes: Option<String>,
    pub at: Option<String>,
    pub incomplete: bool,
    pub no_sync: bool,
}

pub async fn run_log(args: LogArgs, ctx: &Context) -> Result<(), CliError> {
    let owner_id = ctx.owner()?;
    let performed_at = args.at.as_deref().map(parse_timestamp).transpose()?;

    let store = ctx.open_store().await?;
    let record = store
        .log(NewExecution {
            workout_id: args.workout_id,
            workout_name: args.name,
            owner_id: owner_id.to_string(),
            notes: args.notes,
            duration_seconds: args.duration,
            performed_at,
            completed: Some(!args.incomplete),
        })
        .await?;
    println!("{}", record.id);

    if args.no_sync {
        return Ok(());
    }

    // Upload failures never fail the log command; the record stays pending
    match ctx.engine(&store) {
        Ok(Some(engine)) => {
            let upload = SyncTrigger::new(engine).after_local_write(owner_id);
            match upload.await {
                Ok(Ok(SyncOutcome::Completed(report))) => {
                    tracing::debug!("{}", format_report(&report));
                }
                Ok(Ok(SyncOutcome::Skipped)) => {}
                Ok(Err(error)) => tracing::warn!(%error, "Upload after log failed; will retry on next sync"),
                Err(error) => tracing::warn!(%error, "Upload task ended abnormally"),
            }
        }
        Ok(None) => tracing::debug!("Sync not configured; execution kept locally"),
        Err(error) => tracing::warn!(%error, "Sync unavailable; execution kept locally"),
    }

    Ok(())
}

pub fn parse_timestamp(raw: &str) -> Result<i64, CliError> {
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|date_time| date_time.timestamp_millis())
        .map_err(|_| CliError::InvalidTimestamp(raw.to_string()))
}
