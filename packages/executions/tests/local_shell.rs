// ABOUTME: Shell actions against a host-directory runtime
// ABOUTME: Checks that real processes settle on exit and keep the lane moving

#![cfg(unix)]

use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::broadcast;
use workbench_core::{ActionData, ActionStatus};
use workbench_executions::{ActionRunner, RunnerSettings};
use workbench_sandbox::{LocalRuntime, UnavailableToolInvoker};

fn shell(command: &str) -> ActionData {
    ActionData::Shell {
        content: command.to_string(),
    }
}

async fn local_runner(temp_dir: &TempDir) -> ActionRunner {
    let runtime = LocalRuntime::create(temp_dir.path().join("sandbox"))
        .await
        .expect("Failed to create runtime");
    let (events, _) = broadcast::channel(256);
    ActionRunner::new(
        "msg-1",
        Arc::new(runtime),
        Arc::new(UnavailableToolInvoker),
        RunnerSettings::default(),
        None,
        events,
    )
}

/// A command that leaves a background child behind
///
/// This test verifies:
/// 1. The action completes when the shell exits, not when the child does
/// 2. Output written before the exit is kept in the transcript
/// 3. The next action on the lane runs without waiting for the child
#[tokio::test]
async fn test_background_child_does_not_hold_the_lane() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let runner = local_runner(&temp_dir).await;

    runner.register("serve", shell("sleep 4 & echo started"));
    runner.register("next", shell("echo next"));
    runner
        .schedule("serve", shell("sleep 4 & echo started"))
        .unwrap();
    runner.schedule("next", shell("echo next")).unwrap();

    let started = Instant::now();
    tokio::time::timeout(Duration::from_secs(2), runner.wait_idle())
        .await
        .expect("lane should drain while the background child is alive");
    assert!(started.elapsed() < Duration::from_secs(2));

    let serve = runner.state("serve").unwrap();
    assert_eq!(serve.status, ActionStatus::Complete);
    assert_eq!(
        serve.result.as_deref(),
        Some("Command: sleep 4 & echo started\nExit Code: 0\nOutput:\nstarted")
    );

    let next = runner.state("next").unwrap();
    assert_eq!(next.status, ActionStatus::Complete);
    assert_eq!(
        next.result.as_deref(),
        Some("Command: echo next\nExit Code: 0\nOutput:\nnext")
    );
}

#[tokio::test]
async fn test_exit_code_and_stderr_are_recorded() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let runner = local_runner(&temp_dir).await;

    runner.register("a1", shell("echo oops >&2; exit 7"));
    runner.schedule("a1", shell("echo oops >&2; exit 7")).unwrap();
    runner.wait_idle().await;

    let state = runner.state("a1").unwrap();
    assert_eq!(state.status, ActionStatus::Complete);
    assert_eq!(
        state.result.as_deref(),
        Some("Command: echo oops >&2; exit 7\nExit Code: 7\nOutput:\noops")
    );
}
