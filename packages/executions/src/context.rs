// ABOUTME: Per-action execution context handed to each action handler
// ABOUTME: Carries the cancellation token, the result transcript and the output event sink

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::types::{ActionEvent, ActionUpdate};

/// Accumulates the human-readable result of an action, one line at a time.
///
/// Shared between the handler and the runner so a partial transcript
/// survives an abort.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Transcript {
    pub fn push(&self, line: impl Into<String>) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    pub fn is_empty(&self) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn contents(&self) -> String {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .join("\n")
    }
}

pub struct ActionContext {
    pub message_id: String,
    pub action_id: String,
    pub cancel: CancellationToken,
    transcript: Transcript,
    events: broadcast::Sender<ActionEvent>,
}

impl ActionContext {
    pub fn new(
        message_id: &str,
        action_id: &str,
        cancel: CancellationToken,
        events: broadcast::Sender<ActionEvent>,
    ) -> Self {
        Self {
            message_id: message_id.to_string(),
            action_id: action_id.to_string(),
            cancel,
            transcript: Transcript::default(),
            events,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn record(&self, line: impl Into<String>) {
        self.transcript.push(line);
    }

    pub fn transcript(&self) -> Transcript {
        self.transcript.clone()
    }

    /// Forward live process output to subscribers
    pub fn emit_output(&self, text: &str) {
        // No subscribers is not an error
        let _ = self.events.send(ActionEvent::new(
            &self.message_id,
            &self.action_id,
            ActionUpdate::Output(text.to_string()),
        ));
    }
}
