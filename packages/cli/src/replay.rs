// ABOUTME: Replays recorded parser events against an artifact registry
// ABOUTME: Parses JSON Lines event logs and collects the final states and feedback results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};
use workbench_core::ActionDescriptor;
use workbench_executions::{
    ArtifactRegistry, ArtifactSnapshot, ArtifactUpdate, ExecutionsError, ToolResult,
};

/// One line of a replay log, as the message parser would have emitted it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ReplayEvent {
    #[serde(rename_all = "camelCase")]
    Artifact {
        message_id: String,
        id: String,
        title: String,
    },
    #[serde(rename_all = "camelCase")]
    Close { message_id: String },
    Add(ActionDescriptor),
    Run(ActionDescriptor),
    #[serde(rename_all = "camelCase")]
    Abort {
        message_id: String,
        action_id: String,
    },
    /// Block until every lane has drained
    Wait,
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Event {index}: {source}")]
    Contract {
        index: usize,
        #[source]
        source: ExecutionsError,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub artifacts: Vec<ArtifactSnapshot>,
    pub results: BTreeMap<String, Vec<ToolResult>>,
}

/// Parse a JSON Lines log; blank lines and `#` comments are skipped
pub fn parse_events(input: &str) -> Result<Vec<ReplayEvent>, ReplayError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| ReplayError::Parse {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Feed `events` into `registry`, then wait for all lanes and report
pub async fn replay(
    registry: &mut ArtifactRegistry,
    events: Vec<ReplayEvent>,
) -> Result<ReplayReport, ReplayError> {
    info!("Replaying {} events", events.len());

    for (index, event) in events.into_iter().enumerate() {
        let contract = |source: ExecutionsError| ReplayError::Contract { index, source };
        debug!(index, ?event, "Replaying event");

        match event {
            ReplayEvent::Artifact {
                message_id,
                id,
                title,
            } => {
                registry.create_artifact(&message_id, &id, &title);
            }
            ReplayEvent::Close { message_id } => registry
                .update_artifact(
                    &message_id,
                    ArtifactUpdate {
                        title: None,
                        closed: Some(true),
                    },
                )
                .map_err(contract)?,
            ReplayEvent::Add(descriptor) => {
                registry.add_action(&descriptor).map_err(contract)?;
            }
            ReplayEvent::Run(descriptor) => {
                registry.run_action(&descriptor).map_err(contract)?;
            }
            ReplayEvent::Abort {
                message_id,
                action_id,
            } => registry
                .abort_action(&message_id, &action_id)
                .map_err(contract)?,
            ReplayEvent::Wait => registry.wait_idle().await,
        }
    }

    registry.wait_idle().await;

    let artifacts = registry.artifacts();
    let results = artifacts
        .iter()
        .map(|artifact| {
            (
                artifact.message_id.clone(),
                registry.completed_action_results(&artifact.message_id),
            )
        })
        .collect();

    Ok(ReplayReport { artifacts, results })
}
