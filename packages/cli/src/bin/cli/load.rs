use anyhow::Context;
use colored::*;
use std::path::Path;
use workbench_core::WorkbenchConfig;
use workbench_projects::read_host_tree;

use super::open_workbench;

pub async fn load_directory(
    config: &WorkbenchConfig,
    dir: &Path,
    project_id: &str,
    project_name: Option<&str>,
    reset: bool,
) -> anyhow::Result<()> {
    let files =
        read_host_tree(dir).with_context(|| format!("Failed to read {}", dir.display()))?;

    let mut workbench = open_workbench(config).await?;
    if reset {
        workbench.reset_workbench().await?;
    }

    let report = workbench
        .load_project_files(files, project_name, project_id)
        .await?;

    println!(
        "{} {} files into {}",
        "Loaded".green().bold(),
        report.loaded,
        config.sandbox_dir.display()
    );
    if report.failed > 0 {
        println!("{} {} files skipped", "Warning:".yellow(), report.failed);
    }
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
