use liftsync_core::ExecutionEdit;

use crate::commands::common::{resolve_execution, Context};
use crate::error::CliError;

pub struct EditArgs {
    pub id: String,
    pub notes: Option<String>,
    pub clear_notes: bool,
    pub duration: Option<u32>,
    pub completed: Option<bool>,
}

pub fn build_edit(args: &EditArgs) -> Result<ExecutionEdit, CliError> {
    let notes = if args.clear_notes {
        Some(None)
    } else {
        args.notes.clone().map(Some)
    };
    let edit = ExecutionEdit {
        notes,
        duration_seconds: args.duration,
        completed: args.completed,
    };
    if edit.is_empty() {
        return Err(CliError::EmptyEdit);
    }
    Ok(edit)
}

pub async fn run_edit(args: EditArgs, ctx: &Context) -> Result<(), CliError> {
    let edit = build_edit(&args)?;
    let owner_id = ctx.owner()?;
    let store = ctx.open_store().await?;
    let record = resolve_execution(&args.id, owner_id, &store).await?;

    let updated = store.edit(&record.id, &edit).await?;
    println!("{}", updated.id);
    Ok(())
}
