use liftsync_core::{SyncEvent, SyncTrigger};

use crate::cli::SyncDirection;
use crate::commands::common::{format_report, Context};
use crate::error::CliError;

pub async fn run_sync(
    direction: SyncDirection,
    watch: bool,
    ctx: &Context,
) -> Result<(), CliError> {
    let owner_id = ctx.owner()?;
    let store = ctx.open_store().await?;
    let engine = ctx.engine(&store)?.ok_or(CliError::SyncNotConfigured)?;

    if watch {
        return run_watch(SyncTrigger::new(engine), owner_id, ctx).await;
    }

    let reports = match direction {
        SyncDirection::Upload => engine
            .upload(owner_id)
            .await?
            .completed()
            .map(|report| vec![report]),
        SyncDirection::Download => engine
            .download(owner_id)
            .await?
            .completed()
            .map(|report| vec![report]),
        SyncDirection::All => engine
            .sync(owner_id)
            .await?
            .completed()
            .map(|round| vec![round.upload, round.download]),
    };

    match reports {
        Some(reports) => {
            for report in &reports {
                println!("{}", format_report(report));
            }
        }
        None => println!("A sync pass is already running; nothing to do."),
    }
    Ok(())
}

async fn run_watch(trigger: SyncTrigger, owner_id: &str, ctx: &Context) -> Result<(), CliError> {
    let mut events = trigger.engine().subscribe();
    let periodic = trigger.spawn_periodic(owner_id, ctx.settings.sync_interval)?;
    println!(
        "Syncing every {}s; press Ctrl-C to stop.",
        ctx.settings.sync_interval.as_secs()
    );

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            event = events.recv() => match event {
                Ok(SyncEvent::PassFinished(report)) => println!("{}", format_report(&report)),
                Ok(SyncEvent::PassFailed { kind, message, .. }) => eprintln!("{kind} failed: {message}"),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Dropped sync events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    periodic.stop().await;
    Ok(())
}

