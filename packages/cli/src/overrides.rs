// ABOUTME: Command-line overrides layered on top of the environment configuration
// ABOUTME: Flags win over WORKBENCH_* variables when both are given

use std::path::PathBuf;
use workbench_core::{ConfigError, PathPolicy, WorkbenchConfig};

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sandbox_dir: Option<PathBuf>,
    pub path_policy: Option<String>,
    pub serialize_writes: bool,
}

impl Overrides {
    pub fn apply(&self, mut config: WorkbenchConfig) -> Result<WorkbenchConfig, ConfigError> {
        if let Some(dir) = &self.sandbox_dir {
            config.sandbox_dir = dir.clone();
        }
        if let Some(policy) = &self.path_policy {
            config.path_policy = policy.parse::<PathPolicy>()?;
        }
        if self.serialize_writes {
            config.serialize_writes = true;
        }
        Ok(config)
    }
}
