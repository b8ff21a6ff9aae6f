// ABOUTME: Event, snapshot and feedback types produced by the action engine
// ABOUTME: Structures observed by the UI and returned to the assistant-feedback loop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use workbench_core::{ActionState, ActionStatus, PathPolicy, WorkbenchConfig};

/// Change to a single action, published on the engine's event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ActionUpdate {
    Status(ActionStatus),
    Output(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEvent {
    pub message_id: String,
    pub action_id: String,
    pub update: ActionUpdate,
    pub timestamp: DateTime<Utc>,
}

impl ActionEvent {
    pub fn new(message_id: &str, action_id: &str, update: ActionUpdate) -> Self {
        Self {
            message_id: message_id.to_string(),
            action_id: action_id.to_string(),
            update,
            timestamp: Utc::now(),
        }
    }

    /// Status carried by this event, if it is a status change
    pub fn status(&self) -> Option<ActionStatus> {
        match self.update {
            ActionUpdate::Status(status) => Some(status),
            ActionUpdate::Output(_) => None,
        }
    }
}

/// Partial update applied to an existing artifact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactUpdate {
    pub title: Option<String>,
    pub closed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSnapshot {
    pub action_id: String,
    #[serde(flatten)]
    pub state: ActionState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSnapshot {
    pub id: String,
    pub message_id: String,
    pub title: String,
    pub closed: bool,
    pub actions: Vec<ActionSnapshot>,
}

/// Outcome of one action, fed back to the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_name: String,
    pub status: ActionStatus,
    pub result: String,
}

/// Settings every action runner shares
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    pub project_root: String,
    pub path_policy: PathPolicy,
    pub shell: String,
}

impl From<&WorkbenchConfig> for RunnerSettings {
    fn from(config: &WorkbenchConfig) -> Self {
        Self {
            project_root: config.project_root.clone(),
            path_policy: config.path_policy,
            shell: config.shell.clone(),
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from(&WorkbenchConfig::default())
    }
}
