// ABOUTME: Shell action handler running commands through the sandbox shell
// ABOUTME: Streams output to subscribers and kills the process when the action is aborted

use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};
use workbench_sandbox::{SandboxProcess, SpawnOptions};

use super::HandlerEnv;
use crate::context::ActionContext;
use crate::error::ActionError;

/// How long output is still collected once the shell itself has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(200);

/// Run `content` with `<shell> -c`.
///
/// The action settles when the shell exits, even if a backgrounded child
/// still holds its output pipes. A non-zero exit code is recorded in the
/// transcript but does not fail the action; only spawn and process errors do.
pub async fn run_shell(
    ctx: &ActionContext,
    env: &HandlerEnv,
    command: &str,
) -> Result<(), ActionError> {
    let args = vec!["-c".to_string(), command.to_string()];
    ctx.record(format!("Command: {}", command));

    let mut process = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Err(ActionError::Aborted),
        spawned = env.runtime.spawn(&env.settings.shell, &args, SpawnOptions::default()) => {
            spawned.map_err(|e| ActionError::Execution(format!("Failed to start command: {}", e)))?
        }
    };

    let mut stream = process.take_output();
    let mut output = String::new();
    let mut streams_open = true;
    let exit_code = loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                return abort_process(ctx, process.as_mut(), &output).await;
            }
            chunk = stream.recv(), if streams_open => match chunk {
                Some(chunk) => collect_chunk(ctx, &mut output, &chunk.text()),
                None => streams_open = false,
            },
            code = process.wait() => {
                break code.map_err(|e| {
                    ActionError::Execution(format!("Command did not finish: {}", e))
                })?;
            }
        }
    };

    // Background children can keep the pipes open after the shell exits, so
    // only what arrives within the grace period is kept
    if streams_open {
        let deadline = Instant::now() + OUTPUT_GRACE;
        while let Ok(Some(chunk)) = timeout_at(deadline, stream.recv()).await {
            collect_chunk(ctx, &mut output, &chunk.text());
        }
    }

    if exit_code != 0 {
        debug!(
            "Command for action {} exited with {}; recording as complete",
            ctx.action_id, exit_code
        );
    }
    ctx.record(format!("Exit Code: {}", exit_code));
    ctx.record(format!("Output:\n{}", output.trim()));
    Ok(())
}

fn collect_chunk(ctx: &ActionContext, output: &mut String, text: &str) {
    ctx.emit_output(text);
    output.push_str(text);
}

async fn abort_process(
    ctx: &ActionContext,
    process: &mut dyn SandboxProcess,
    output: &str,
) -> Result<(), ActionError> {
    if let Err(e) = process.kill().await {
        warn!("Failed to kill process for action {}: {}", ctx.action_id, e);
    }
    ctx.record("Exit Code: aborted");
    ctx.record(format!("Output:\n{}", output.trim()));
    Err(ActionError::Aborted)
}
