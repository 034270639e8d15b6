use crate::commands::common::{
    execution_to_list_item, format_execution_lines, Context, ExecutionListItem,
};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    pending_only: bool,
    as_json: bool,
    ctx: &Context,
) -> Result<(), CliError> {
    let owner_id = ctx.owner()?;
    let store = ctx.open_store().await?;
    let records = if pending_only {
        let mut pending = store.query_dirty(owner_id).await?;
        pending.sort_by(|left, right| right.performed_at.cmp(&left.performed_at));
        pending.truncate(limit);
        pending
    } else {
        store.list(owner_id, limit, 0).await?
    };

    if as_json {
        let json_items = records
            .iter()
            .map(execution_to_list_item)
            .collect::<Vec<ExecutionListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if records.is_empty() {
        println!("No executions recorded.");
    } else {
        for line in format_execution_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
