use anyhow::Context;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use std::path::Path;
use workbench_cli::{parse_events, replay, ReplayReport};
use workbench_core::{ActionStatus, WorkbenchConfig};

use super::open_workbench;

pub async fn run_events(
    config: &WorkbenchConfig,
    events: &Path,
    table: bool,
) -> anyhow::Result<()> {
    let input = tokio::fs::read_to_string(events)
        .await
        .with_context(|| format!("Failed to read {}", events.display()))?;
    let events = parse_events(&input)?;

    let mut workbench = open_workbench(config).await?;
    workbench.set_visible(true);
    let report = replay(workbench.registry_mut(), events).await?;

    if table {
        print_table(&report);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn status_cell(status: ActionStatus) -> String {
    match status {
        ActionStatus::Complete => status.as_str().green().to_string(),
        ActionStatus::Failed => status.as_str().red().to_string(),
        ActionStatus::Aborted => status.as_str().yellow().to_string(),
        ActionStatus::Pending | ActionStatus::Running => status.as_str().dimmed().to_string(),
    }
}

fn first_line(text: Option<&str>) -> String {
    text.and_then(|t| t.lines().next())
        .unwrap_or("-")
        .to_string()
}

fn print_table(report: &ReplayReport) {
    if report.artifacts.is_empty() {
        println!("{}", "No artifacts in event log".yellow());
        return;
    }

    for artifact in &report.artifacts {
        println!(
            "{} {} ({})",
            "Artifact".blue().bold(),
            artifact.title,
            artifact.message_id.dimmed()
        );

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Action", "Type", "Status", "Result"]);

        for action in &artifact.actions {
            let summary = match &action.state.error {
                Some(error) => first_line(Some(error)),
                None => first_line(action.state.result.as_deref()),
            };
            table.add_row(vec![
                action.action_id.clone(),
                action.state.kind.to_string(),
                status_cell(action.state.status),
                summary,
            ]);
        }
        println!("{}", table);
    }
}
