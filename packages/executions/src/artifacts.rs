// ABOUTME: Artifact registry mapping assistant messages to their action runners
// ABOUTME: Dispatches parsed actions to the owning runner and collects feedback results

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use workbench_core::{ActionDescriptor, WorkbenchConfig};
use workbench_sandbox::{SandboxRuntime, ToolInvoker};

use crate::error::{ExecutionsError, Result};
use crate::locks::PathLocks;
use crate::runner::ActionRunner;
use crate::types::{ActionEvent, ArtifactSnapshot, ArtifactUpdate, RunnerSettings, ToolResult};

const EVENT_CAPACITY: usize = 1024;

/// A titled group of actions produced by one assistant message
pub struct Artifact {
    pub id: String,
    pub message_id: String,
    pub title: String,
    pub closed: bool,
    runner: ActionRunner,
}

impl Artifact {
    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    pub fn snapshot(&self) -> ArtifactSnapshot {
        ArtifactSnapshot {
            id: self.id.clone(),
            message_id: self.message_id.clone(),
            title: self.title.clone(),
            closed: self.closed,
            actions: self.runner.states(),
        }
    }
}

/// Registry of artifacts keyed by message id, in creation order.
///
/// Artifacts run independently of each other; only actions within one
/// artifact are serialized.
pub struct ArtifactRegistry {
    runtime: Arc<dyn SandboxRuntime>,
    tools: Arc<dyn ToolInvoker>,
    settings: RunnerSettings,
    path_locks: Option<Arc<PathLocks>>,
    events: broadcast::Sender<ActionEvent>,
    artifacts: HashMap<String, Artifact>,
    order: Vec<String>,
}

impl ArtifactRegistry {
    pub fn new(
        runtime: Arc<dyn SandboxRuntime>,
        tools: Arc<dyn ToolInvoker>,
        config: &WorkbenchConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let path_locks = config.serialize_writes.then(|| Arc::new(PathLocks::new()));
        Self {
            runtime,
            tools,
            settings: RunnerSettings::from(config),
            path_locks,
            events,
            artifacts: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActionEvent> {
        self.events.subscribe()
    }

    /// Create the artifact for `message_id`. Returns `false` if it exists.
    pub fn create_artifact(&mut self, message_id: &str, id: &str, title: &str) -> bool {
        if self.artifacts.contains_key(message_id) {
            debug!("Artifact for message {} already exists", message_id);
            return false;
        }

        let runner = ActionRunner::new(
            message_id,
            self.runtime.clone(),
            self.tools.clone(),
            self.settings.clone(),
            self.path_locks.clone(),
            self.events.clone(),
        );
        self.artifacts.insert(
            message_id.to_string(),
            Artifact {
                id: id.to_string(),
                message_id: message_id.to_string(),
                title: title.to_string(),
                closed: false,
                runner,
            },
        );
        self.order.push(message_id.to_string());
        info!("Created artifact {} for message {}", id, message_id);
        true
    }

    pub fn update_artifact(&mut self, message_id: &str, update: ArtifactUpdate) -> Result<()> {
        let Some(artifact) = self.artifacts.get_mut(message_id) else {
            return Err(Self::unknown(message_id));
        };
        if let Some(title) = update.title {
            artifact.title = title;
        }
        if let Some(closed) = update.closed {
            artifact.closed = closed;
        }
        Ok(())
    }

    pub fn artifact(&self, message_id: &str) -> Option<&Artifact> {
        self.artifacts.get(message_id)
    }

    /// The earliest artifact still registered
    pub fn first_artifact(&self) -> Option<&Artifact> {
        self.order.first().and_then(|id| self.artifacts.get(id))
    }

    pub fn artifacts(&self) -> Vec<ArtifactSnapshot> {
        self.order
            .iter()
            .filter_map(|id| self.artifacts.get(id))
            .map(Artifact::snapshot)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Register an action with its artifact's runner
    pub fn add_action(&self, descriptor: &ActionDescriptor) -> Result<bool> {
        let artifact = self.require(&descriptor.message_id)?;
        Ok(artifact
            .runner
            .register(&descriptor.action_id, descriptor.action.clone()))
    }

    /// Schedule an action on its artifact's lane
    pub fn run_action(&self, descriptor: &ActionDescriptor) -> Result<bool> {
        let artifact = self.require(&descriptor.message_id)?;
        artifact
            .runner
            .schedule(&descriptor.action_id, descriptor.action.clone())
    }

    pub fn abort_action(&self, message_id: &str, action_id: &str) -> Result<()> {
        self.require(message_id)?.runner.abort(action_id)
    }

    /// Results for the assistant once every action of the artifact is terminal
    pub fn completed_action_results(&self, message_id: &str) -> Vec<ToolResult> {
        self.artifacts
            .get(message_id)
            .and_then(|artifact| artifact.runner.completed_results())
            .unwrap_or_default()
    }

    /// Wait for every artifact's lane to drain
    pub async fn wait_idle(&self) {
        for artifact in self.artifacts.values() {
            artifact.runner.wait_idle().await;
        }
    }

    /// Drop every artifact, aborting whatever is still pending or running.
    ///
    /// Returns once every lane has finished its in-flight handler, so no
    /// write from a cleared artifact can land afterwards.
    pub async fn clear(&mut self) {
        if self.artifacts.is_empty() {
            return;
        }
        info!("Clearing {} artifacts", self.artifacts.len());
        for artifact in self.artifacts.values() {
            artifact.runner.abort_all();
        }
        for artifact in self.artifacts.values() {
            artifact.runner.wait_idle().await;
        }
        self.order.clear();
        self.artifacts.clear();
    }

    fn require(&self, message_id: &str) -> Result<&Artifact> {
        self.artifacts.get(message_id).ok_or_else(|| {
            error!("No artifact registered for message {}", message_id);
            Self::unknown(message_id)
        })
    }

    fn unknown(message_id: &str) -> ExecutionsError {
        ExecutionsError::UnknownArtifact(message_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workbench_sandbox::{MemoryRuntime, UnavailableToolInvoker};

    fn registry() -> ArtifactRegistry {
        ArtifactRegistry::new(
            Arc::new(MemoryRuntime::new()),
            Arc::new(UnavailableToolInvoker),
            &WorkbenchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_create_artifact_is_idempotent() {
        let mut registry = registry();
        assert!(registry.create_artifact("msg-1", "todo-app", "Todo App"));
        assert!(!registry.create_artifact("msg-1", "other", "Other"));

        let artifact = registry.artifact("msg-1").unwrap();
        assert_eq!(artifact.id, "todo-app");
        assert_eq!(artifact.title, "Todo App");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_first_artifact_follows_creation_order() {
        let mut registry = registry();
        assert!(registry.first_artifact().is_none());

        registry.create_artifact("msg-2", "second", "Second");
        registry.create_artifact("msg-1", "first", "First");
        assert_eq!(registry.first_artifact().unwrap().id, "second");

        let ids: Vec<String> = registry.artifacts().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["second".to_string(), "first".to_string()]);
    }

    #[tokio::test]
    async fn test_update_artifact() {
        let mut registry = registry();
        registry.create_artifact("msg-1", "app", "Draft");

        registry
            .update_artifact(
                "msg-1",
                ArtifactUpdate {
                    title: Some("Final".to_string()),
                    closed: Some(true),
                },
            )
            .unwrap();
        let artifact = registry.artifact("msg-1").unwrap();
        assert_eq!(artifact.title, "Final");
        assert!(artifact.closed);

        assert_eq!(
            registry.update_artifact("missing", ArtifactUpdate::default()),
            Err(ExecutionsError::UnknownArtifact("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let mut registry = registry();
        registry.create_artifact("msg-1", "a", "A");
        registry.create_artifact("msg-2", "b", "B");
        registry.clear().await;
        assert!(registry.is_empty());
        assert!(registry.first_artifact().is_none());
        assert!(registry.completed_action_results("msg-1").is_empty());
    }
}
