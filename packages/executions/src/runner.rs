// ABOUTME: Action runner owning one artifact's actions and their serialized execution lane
// ABOUTME: A single worker task executes scheduled actions strictly in scheduling order

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use workbench_core::{sanitize_message, ActionData, ActionState, ActionStatus};
use workbench_sandbox::{SandboxRuntime, ToolInvoker};

use crate::context::ActionContext;
use crate::error::{ActionError, ExecutionsError, Result};
use crate::handlers::{self, HandlerEnv};
use crate::locks::PathLocks;
use crate::types::{ActionEvent, ActionSnapshot, ActionUpdate, RunnerSettings, ToolResult};

struct ActionEntry {
    data: ActionData,
    status: ActionStatus,
    executed: bool,
    cancel: CancellationToken,
    result: Option<String>,
    error: Option<String>,
}

impl ActionEntry {
    /// Move to `next` if the lifecycle allows it
    fn transition(&mut self, next: ActionStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    fn state(&self) -> ActionState {
        ActionState {
            kind: self.data.kind(),
            status: self.status,
            executed: self.executed,
            content: self.data.content().to_string(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

#[derive(Default)]
struct ActionTable {
    entries: HashMap<String, ActionEntry>,
    order: Vec<String>,
}

struct RunnerShared {
    message_id: String,
    table: Mutex<ActionTable>,
    events: broadcast::Sender<ActionEvent>,
    /// Actions scheduled but not yet drained by the worker
    queued: watch::Sender<usize>,
    env: HandlerEnv,
}

impl RunnerShared {
    fn table(&self) -> MutexGuard<'_, ActionTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, action_id: &str, status: ActionStatus) {
        // No subscribers is not an error
        let _ = self.events.send(ActionEvent::new(
            &self.message_id,
            action_id,
            ActionUpdate::Status(status),
        ));
    }

    /// Run one dequeued action to completion; never fails the lane
    async fn execute(&self, action_id: &str) {
        let (action, cancel) = {
            let mut table = self.table();
            let Some(entry) = table.entries.get_mut(action_id) else {
                error!(
                    "Queued action {} missing from artifact {}",
                    action_id, self.message_id
                );
                return;
            };
            if entry.cancel.is_cancelled() || !entry.transition(ActionStatus::Running) {
                debug!("Skipping action {} ({})", action_id, entry.status);
                return;
            }
            (entry.data.clone(), entry.cancel.clone())
        };
        self.emit(action_id, ActionStatus::Running);
        debug!("Running {} action {}", action.kind(), action_id);

        let ctx = ActionContext::new(&self.message_id, action_id, cancel, self.events.clone());
        let transcript = ctx.transcript();
        let env = self.env.clone();

        // A separate task keeps a panicking handler from taking the lane down
        let handle =
            tokio::spawn(async move { handlers::run_action(&ctx, &env, &action).await });
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    "handler panicked".to_string()
                } else {
                    join_error.to_string()
                };
                Err(ActionError::Panicked(reason))
            }
        };

        let transcript = (!transcript.is_empty()).then(|| transcript.contents());
        self.settle(action_id, outcome, transcript);
    }

    fn settle(
        &self,
        action_id: &str,
        outcome: std::result::Result<(), ActionError>,
        transcript: Option<String>,
    ) {
        let status = {
            let mut table = self.table();
            let Some(entry) = table.entries.get_mut(action_id) else {
                return;
            };

            if entry.result.is_none() {
                entry.result = transcript;
            }

            if entry.status.is_terminal() {
                // Aborted while running: the abort wins over whatever the handler reported
                debug!(
                    "Action {} already {}, ignoring handler outcome",
                    action_id, entry.status
                );
                return;
            }

            let next = match outcome {
                Ok(()) => ActionStatus::Complete,
                Err(ActionError::Aborted) => ActionStatus::Aborted,
                Err(e) => {
                    let message = sanitize_message(&e.to_string());
                    warn!("Action {} failed: {}", action_id, message);
                    entry.error = Some(message);
                    ActionStatus::Failed
                }
            };
            if !entry.transition(next) {
                error!(
                    "Action {} cannot move from {} to {}",
                    action_id, entry.status, next
                );
                return;
            }
            next
        };
        self.emit(action_id, status);
    }
}

/// Owns the actions of one artifact and executes them one at a time.
///
/// Must be created inside a Tokio runtime; dropping the runner aborts every
/// action that has not reached a terminal status.
pub struct ActionRunner {
    shared: Arc<RunnerShared>,
    lane: mpsc::UnboundedSender<String>,
}

impl ActionRunner {
    pub fn new(
        message_id: &str,
        runtime: Arc<dyn SandboxRuntime>,
        tools: Arc<dyn ToolInvoker>,
        settings: RunnerSettings,
        path_locks: Option<Arc<PathLocks>>,
        events: broadcast::Sender<ActionEvent>,
    ) -> Self {
        let (queued, _) = watch::channel(0);
        let shared = Arc::new(RunnerShared {
            message_id: message_id.to_string(),
            table: Mutex::new(ActionTable::default()),
            events,
            queued,
            env: HandlerEnv {
                runtime,
                tools,
                settings,
                path_locks,
            },
        });

        let (lane, mut receiver) = mpsc::unbounded_channel::<String>();
        let worker = shared.clone();
        tokio::spawn(async move {
            while let Some(action_id) = receiver.recv().await {
                worker.execute(&action_id).await;
                worker.queued.send_modify(|n| *n = n.saturating_sub(1));
            }
            debug!("Action lane for {} closed", worker.message_id);
        });

        Self { shared, lane }
    }

    pub fn message_id(&self) -> &str {
        &self.shared.message_id
    }

    /// Make an action known without running it.
    ///
    /// Returns `false` when the id was already registered; the existing
    /// entry is left untouched.
    pub fn register(&self, action_id: &str, data: ActionData) -> bool {
        {
            let mut table = self.shared.table();
            if table.entries.contains_key(action_id) {
                return false;
            }
            table.entries.insert(
                action_id.to_string(),
                ActionEntry {
                    data,
                    status: ActionStatus::Pending,
                    executed: false,
                    cancel: CancellationToken::new(),
                    result: None,
                    error: None,
                },
            );
            table.order.push(action_id.to_string());
        }
        self.shared.emit(action_id, ActionStatus::Pending);
        true
    }

    /// Append a registered action to the lane with its final content.
    ///
    /// Only the first call for an action has any effect. Returns whether the
    /// action was enqueued; an action aborted before scheduling is marked
    /// executed but never runs.
    pub fn schedule(&self, action_id: &str, data: ActionData) -> Result<bool> {
        let mut table = self.shared.table();
        let Some(entry) = table.entries.get_mut(action_id) else {
            error!(
                "Scheduling unregistered action {} for {}",
                action_id, self.shared.message_id
            );
            return Err(self.unknown(action_id));
        };

        if entry.executed {
            debug!("Action {} already scheduled", action_id);
            return Ok(false);
        }
        entry.executed = true;
        entry.data = data;

        if entry.status.is_terminal() {
            return Ok(false);
        }

        // Enqueue under the table lock so lane order matches scheduling order
        self.shared.queued.send_modify(|n| *n += 1);
        if self.lane.send(action_id.to_string()).is_err() {
            self.shared.queued.send_modify(|n| *n = n.saturating_sub(1));
            error!("Action lane for {} is closed", self.shared.message_id);
            return Ok(false);
        }
        Ok(true)
    }

    /// Cancel an action. Pending actions never start; running ones are
    /// told to stop. Aborting a terminal action does nothing.
    pub fn abort(&self, action_id: &str) -> Result<()> {
        {
            let mut table = self.shared.table();
            let Some(entry) = table.entries.get_mut(action_id) else {
                error!(
                    "Aborting unregistered action {} for {}",
                    action_id, self.shared.message_id
                );
                return Err(self.unknown(action_id));
            };
            if !entry.transition(ActionStatus::Aborted) {
                return Ok(());
            }
            entry.cancel.cancel();
        }
        info!("Aborted action {} in {}", action_id, self.shared.message_id);
        self.shared.emit(action_id, ActionStatus::Aborted);
        Ok(())
    }

    /// Abort every action that has not finished
    pub fn abort_all(&self) {
        let aborted: Vec<String> = {
            let mut table = self.shared.table();
            table
                .entries
                .iter_mut()
                .filter_map(|(id, entry)| {
                    entry.transition(ActionStatus::Aborted).then(|| {
                        entry.cancel.cancel();
                        id.clone()
                    })
                })
                .collect()
        };
        for action_id in &aborted {
            self.shared.emit(action_id, ActionStatus::Aborted);
        }
    }

    pub fn state(&self, action_id: &str) -> Option<ActionState> {
        self.shared
            .table()
            .entries
            .get(action_id)
            .map(ActionEntry::state)
    }

    /// Snapshot of every action in registration order
    pub fn states(&self) -> Vec<ActionSnapshot> {
        let table = self.shared.table();
        table
            .order
            .iter()
            .filter_map(|id| {
                table.entries.get(id).map(|entry| ActionSnapshot {
                    action_id: id.clone(),
                    state: entry.state(),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.table().entries.is_empty()
    }

    /// Results of every action once all of them are terminal, `None` before
    pub fn completed_results(&self) -> Option<Vec<ToolResult>> {
        let table = self.shared.table();
        let entries: Vec<&ActionEntry> = table
            .order
            .iter()
            .filter_map(|id| table.entries.get(id))
            .collect();

        if entries.iter().any(|entry| !entry.status.is_terminal()) {
            return None;
        }

        Some(
            entries
                .into_iter()
                .map(|entry| ToolResult {
                    tool_name: entry.data.tool_name().to_string(),
                    status: entry.status,
                    result: entry
                        .result
                        .clone()
                        .or_else(|| entry.error.clone())
                        .unwrap_or_default(),
                })
                .collect(),
        )
    }

    /// Wait until the lane has drained every scheduled action
    pub async fn wait_idle(&self) {
        let mut queued = self.shared.queued.subscribe();
        // The sender lives in `shared`, which we hold, so this cannot fail
        let _ = queued.wait_for(|n| *n == 0).await;
    }

    fn unknown(&self, action_id: &str) -> ExecutionsError {
        ExecutionsError::UnknownAction {
            message_id: self.shared.message_id.clone(),
            action_id: action_id.to_string(),
        }
    }
}

impl Drop for ActionRunner {
    fn drop(&mut self) {
        self.abort_all();
    }
}
