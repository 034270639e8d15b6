use chrono::Local;
use liftsync_core::ProgressSummary;

use crate::commands::common::Context;
use crate::error::CliError;

pub fn format_summary_lines(summary: &ProgressSummary) -> Vec<String> {
    let hours = summary.total_duration_seconds / 3_600;
    let minutes = (summary.total_duration_seconds % 3_600) / 60;

    let mut lines = vec![
        format!("workouts: {}", summary.total),
        format!("time:     {hours}h {minutes:02}m"),
        String::new(),
    ];
    let widest = summary
        .by_weekday
        .iter()
        .map(|day| day.count)
        .max()
        .unwrap_or(0)
        .max(1);
    for day in &summary.by_weekday {
        let bar = "#".repeat(day.count * 20 / widest);
        lines.push(format!("{:<3} {:>4}  {bar}", day.weekday, day.count));
    }
    if let Some(last) = summary.by_day.last() {
        lines.push(String::new());
        lines.push(format!(
            "active days: {} (last {})",
            summary.by_day.len(),
            last.date
        ));
    }
    lines
}

pub async fn run_stats(as_json: bool, ctx: &Context) -> Result<(), CliError> {
    let owner_id = ctx.owner()?;
    let store = ctx.open_store().await?;
    let records = store.list_all(owner_id).await?;
    let summary = ProgressSummary::from_records(&records, &Local);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }
    Ok(())
}
