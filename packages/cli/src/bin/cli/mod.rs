// ABOUTME: Subcommand implementations for the workbench binary
// ABOUTME: Shared helpers for building the configuration and the local sandbox

use anyhow::Context;
use std::sync::Arc;
use tracing::debug;
use workbench_cli::Overrides;
use workbench_core::WorkbenchConfig;
use workbench_projects::Workbench;
use workbench_sandbox::{LocalRuntime, UnavailableToolInvoker};

pub mod load;
pub mod paths;
pub mod run;

pub fn load_config(overrides: &Overrides) -> anyhow::Result<WorkbenchConfig> {
    let config = WorkbenchConfig::from_env().context("Invalid workbench configuration")?;
    overrides
        .apply(config)
        .context("Invalid command-line option")
}

/// Workbench backed by the host sandbox directory
pub async fn open_workbench(config: &WorkbenchConfig) -> anyhow::Result<Workbench> {
    let runtime = LocalRuntime::create(config.sandbox_dir.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to prepare sandbox directory {}",
                config.sandbox_dir.display()
            )
        })?;
    debug!("Using sandbox at {}", runtime.root().display());

    Ok(Workbench::new(
        Arc::new(runtime),
        Arc::new(UnavailableToolInvoker),
        config.clone(),
    ))
}
