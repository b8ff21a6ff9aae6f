// ABOUTME: Error types for action registration, scheduling and execution
// ABOUTME: Separates contract violations from failures recorded on individual actions

use thiserror::Error;

/// Errors returned to the orchestration layer.
///
/// Every variant signals a broken contract with the parser or UI (operating
/// on an artifact or action that was never registered); none of them is
/// produced by an action failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionsError {
    #[error("No artifact registered for message {0}")]
    UnknownArtifact(String),

    #[error("Action {action_id} is not registered in artifact for message {message_id}")]
    UnknownAction {
        message_id: String,
        action_id: String,
    },
}

pub type Result<T> = std::result::Result<T, ExecutionsError>;

/// Failure of a single action; recorded on the action, never propagated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Action aborted")]
    Aborted,

    #[error("Action handler panicked: {0}")]
    Panicked(String),
}
