// ABOUTME: Environment-driven configuration for the Workbench action engine
// ABOUTME: Project root, path containment policy, write serialization and shell selection

use crate::constants::{DEFAULT_PROJECT_ROOT, DEFAULT_SANDBOX_DIR, DEFAULT_SHELL};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid path policy: {0} (expected 'relocate' or 'reject')")]
    InvalidPathPolicy(String),
    #[error("Invalid boolean for {name}: {value}")]
    InvalidBool { name: String, value: String },
    #[error("Project root must be an absolute path: {0}")]
    InvalidProjectRoot(String),
    #[error("Shell program must not be empty")]
    EmptyShell,
}

/// What a file action does when its target resolves outside the project root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathPolicy {
    /// Write to `<root>/<basename>` and record a warning in the transcript
    #[default]
    Relocate,
    /// Fail the action with a validation error
    Reject,
}

impl FromStr for PathPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relocate" => Ok(PathPolicy::Relocate),
            "reject" => Ok(PathPolicy::Reject),
            _ => Err(ConfigError::InvalidPathPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkbenchConfig {
    pub project_root: String,
    pub path_policy: PathPolicy,
    pub serialize_writes: bool,
    pub shell: String,
    pub sandbox_dir: PathBuf,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            project_root: DEFAULT_PROJECT_ROOT.to_string(),
            path_policy: PathPolicy::default(),
            serialize_writes: false,
            shell: DEFAULT_SHELL.to_string(),
            sandbox_dir: PathBuf::from(DEFAULT_SANDBOX_DIR),
        }
    }
}

impl WorkbenchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let project_root = lookup("WORKBENCH_PROJECT_ROOT")
            .map(|root| root.trim().to_string())
            .unwrap_or(defaults.project_root);
        if !project_root.starts_with('/') {
            return Err(ConfigError::InvalidProjectRoot(project_root));
        }
        let project_root = match project_root.trim_end_matches('/') {
            "" => "/".to_string(),
            trimmed => trimmed.to_string(),
        };

        let path_policy = match lookup("WORKBENCH_PATH_POLICY") {
            Some(value) => value.parse::<PathPolicy>()?,
            None => defaults.path_policy,
        };

        let serialize_writes = match lookup("WORKBENCH_SERIALIZE_WRITES") {
            Some(value) => parse_bool("WORKBENCH_SERIALIZE_WRITES", &value)?,
            None => defaults.serialize_writes,
        };

        let shell = lookup("WORKBENCH_SHELL").unwrap_or(defaults.shell);
        if shell.trim().is_empty() {
            return Err(ConfigError::EmptyShell);
        }

        let sandbox_dir = lookup("WORKBENCH_SANDBOX_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.sandbox_dir);

        let config = WorkbenchConfig {
            project_root,
            path_policy,
            serialize_writes,
            shell,
            sandbox_dir,
        };
        debug!(?config, "Loaded workbench configuration");
        Ok(config)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
