//! liftsync CLI - log workouts offline and sync them in the background
//!
//! Every command works without a network connection; `sync` and the upload
//! after `log` only run when `LIFTSYNC_REMOTE_URL` is configured.

mod cli;
mod commands;
mod error;


use clap::Parser;
use liftsync_core::SyncSettings;

use crate::cli::{Cli, Commands};
use crate::commands::common::{resolve_db_path, Context};
use crate::commands::completions::run_completions;
use crate::commands::edit::{run_edit, EditArgs};
use crate::commands::list::run_list;
use crate::commands::log::{run_log, LogArgs};
use crate::commands::stats::run_stats;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("liftsync=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let ctx = Context {
        db_path: resolve_db_path(cli.db_path)?,
        owner: cli.owner,
        settings: SyncSettings::from_env()?,
    };
    tracing::debug!(settings = ?ctx.settings, "Loaded sync settings");

    match cli.command {
        Commands::Log {
            workout_id,
            name,
            duration,
            notes,
            at,
            incomplete,
            no_sync,
        } => {
            run_log(
                LogArgs {
                    workout_id,
                    name,
                    duration,
                    notes,
                    at,
                    incomplete,
                    no_sync,
                },
                &ctx,
            )
            .await?;
        }
        Commands::List {
            limit,
            pending,
            json,
        } => run_list(limit, pending, json, &ctx).await?,
        Commands::Edit {
            id,
            notes,
            clear_notes,
            duration,
            completed,
        } => {
            run_edit(
                EditArgs {
                    id,
                    notes,
                    clear_notes,
                    duration,
                    completed,
                },
                &ctx,
            )
            .await?;
        }
        Commands::Sync { direction, watch } => run_sync(direction, watch, &ctx).await?,
        Commands::Status { json } => run_status(json, &ctx).await?,
        Commands::Stats { json } => run_stats(json, &ctx).await?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
