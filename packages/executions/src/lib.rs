// ABOUTME: Action execution engine for assistant-produced artifacts
// ABOUTME: Registry of artifacts, per-artifact serialized runners and the shell, file and tool handlers

pub mod artifacts;
pub mod context;
pub mod error;
pub mod handlers;
pub mod locks;
pub mod runner;
pub mod types;

pub use artifacts::{Artifact, ArtifactRegistry};
pub use context::{ActionContext, Transcript};
pub use error::{ActionError, ExecutionsError, Result};
pub use handlers::file::{resolve_target, FileTarget};
pub use locks::PathLocks;
pub use runner::ActionRunner;
pub use types::{
    ActionEvent, ActionSnapshot, ActionUpdate, ArtifactSnapshot, ArtifactUpdate, RunnerSettings,
    ToolResult,
};
