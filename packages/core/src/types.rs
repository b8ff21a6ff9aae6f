// ABOUTME: Action, file and project types shared across the Workbench packages
// ABOUTME: Defines the action lifecycle states and the descriptors delivered by the parser

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds of operation an assistant can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Shell,
    File,
    McpTool,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::File => "file",
            Self::McpTool => "mcp-tool",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a single action.
///
/// Transitions are monotonic: `Pending -> Running -> {Complete, Failed, Aborted}`,
/// plus `Pending -> Aborted` for actions cancelled before their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Running,
    Complete,
    Failed,
    Aborted,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Aborted)
    }

    /// Whether moving from `self` to `next` respects the lifecycle ordering
    pub fn can_transition_to(&self, next: ActionStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Running) | (Self::Pending, Self::Aborted) => true,
            (Self::Running, next) => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of an action as delivered by the parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActionData {
    Shell {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    File {
        content: String,
        file_path: String,
    },
    #[serde(rename_all = "camelCase")]
    McpTool {
        content: String,
        server_name: String,
        tool_name: String,
    },
}

impl ActionData {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Shell { .. } => ActionKind::Shell,
            Self::File { .. } => ActionKind::File,
            Self::McpTool { .. } => ActionKind::McpTool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Shell { content } | Self::File { content, .. } | Self::McpTool { content, .. } => {
                content
            }
        }
    }

    /// Name reported to the assistant-feedback loop for this action's result
    pub fn tool_name(&self) -> &str {
        match self {
            Self::McpTool { tool_name, .. } => tool_name,
            other => other.kind().as_str(),
        }
    }
}

/// One parsed action addressed to an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub message_id: String,
    pub action_id: String,
    pub action: ActionData,
}

/// Observable state of an action, as exposed to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionState {
    pub kind: ActionKind,
    pub status: ActionStatus,
    pub executed: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A file delivered to the workbench; binary content is base64 encoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub is_binary: bool,
}

impl FileEntry {
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            is_binary: false,
        }
    }
}

/// Identifies the project currently loaded into the sandbox
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub project_id: Option<String>,
    pub project_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_status_transitions() {
        use ActionStatus::*;

        assert!(Pending.can_transition_to(Running));
        assert!(Pending.can_transition_to(Aborted));
        assert!(!Pending.can_transition_to(Complete));
        assert!(Running.can_transition_to(Complete));
        assert!(Running.can_transition_to(Failed));
        assert!(Running.can_transition_to(Aborted));
        assert!(!Running.can_transition_to(Pending));

        for terminal in [Complete, Failed, Aborted] {
            assert!(terminal.is_terminal());
            for next in [Pending, Running, Complete, Failed, Aborted] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_descriptor_wire_format() {
        let descriptor: ActionDescriptor = serde_json::from_value(json!({
            "messageId": "msg-1",
            "actionId": "3",
            "action": {
                "type": "mcp-tool",
                "content": "{\"q\": 1}",
                "serverName": "search",
                "toolName": "lookup"
            }
        }))
        .unwrap();

        assert_eq!(descriptor.action.kind(), ActionKind::McpTool);
        assert_eq!(descriptor.action.tool_name(), "lookup");
        assert_eq!(descriptor.action.content(), "{\"q\": 1}");

        let file: ActionData = serde_json::from_value(json!({
            "type": "file",
            "content": "hello",
            "filePath": "src/main.ts"
        }))
        .unwrap();
        assert_eq!(
            file,
            ActionData::File {
                content: "hello".to_string(),
                file_path: "src/main.ts".to_string(),
            }
        );
        assert_eq!(file.tool_name(), "file");
    }

    #[test]
    fn test_unknown_action_type_is_rejected() {
        let result: Result<ActionData, _> =
            serde_json::from_value(json!({"type": "start", "content": "npm run dev"}));
        assert!(result.is_err());
    }
}
