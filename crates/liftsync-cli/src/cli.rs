use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "liftsync")]
#[command(about = "Log workouts offline and sync them when a connection is available")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH", env = "LIFTSYNC_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// User whose history is read and synced
    #[arg(long, global = true, value_name = "ID", env = "LIFTSYNC_OWNER_ID")]
    pub owner: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a completed workout
    #[command(alias = "add")]
    Log {
        /// Identifier of the workout plan
        workout_id: String,
        /// Display name of the workout
        #[arg(short, long)]
        name: String,
        /// Session length as seconds, m:ss or h:mm:ss
        #[arg(short, long, value_parser = parse_duration)]
        duration: u32,
        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
        /// When the workout was performed (RFC 3339, defaults to now)
        #[arg(long, value_name = "TIMESTAMP")]
        at: Option<String>,
        /// Mark the session as not completed
        #[arg(long)]
        incomplete: bool,
        /// Skip the background upload after recording
        #[arg(long)]
        no_sync: bool,
    },
    /// List recent executions
    List {
        /// Number of executions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only executions not yet uploaded
        #[arg(long)]
        pending: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing execution
    Edit {
        /// Execution ID or unique ID prefix
        id: String,
        /// Replace the notes
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        /// Remove the notes
        #[arg(long)]
        clear_notes: bool,
        /// New session length as seconds, m:ss or h:mm:ss
        #[arg(long, value_parser = parse_duration)]
        duration: Option<u32>,
        /// Mark the session completed or not
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Synchronize with the remote store
    Sync {
        /// Which pass to run
        #[arg(value_enum, default_value_t = SyncDirection::All)]
        direction: SyncDirection,
        /// Keep running and sync on an interval until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Show pending uploads and last sync times
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize workout history
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SyncDirection {
    Upload,
    Download,
    All,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// Parse `90`, `1:30` or `1:01:30` into seconds.
pub fn parse_duration(raw: &str) -> Result<u32, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let parts = raw
        .split(':')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| format!("invalid duration `{raw}`"))
        })
        .collect::<Result<Vec<u32>, String>>()?;

    let (hours, minutes, seconds) = match parts.as_slice() {
        [seconds] => (0, 0, *seconds),
        [minutes, seconds] => (0, *minutes, *seconds),
        [hours, minutes, seconds] => (*hours, *minutes, *seconds),
        _ => return Err(format!("invalid duration `{raw}`")),
    };
    if parts.len() > 1 && (seconds >= 60 || (parts.len() == 3 && minutes >= 60)) {
        return Err(format!("invalid duration `{raw}`"));
    }

    hours
        .checked_mul(3_600)
        .and_then(|total| total.checked_add(minutes.checked_mul(60)?))
        .and_then(|total| total.checked_add(seconds))
        .ok_or_else(|| format!("duration `{raw}` is too long"))
}
