// ABOUTME: Dispatch from action payloads to their shell, file and tool-call handlers
// ABOUTME: Handlers report failures as ActionError and write their result into the context transcript

use std::sync::Arc;
use workbench_core::ActionData;
use workbench_sandbox::{SandboxRuntime, ToolInvoker};

use crate::context::ActionContext;
use crate::error::ActionError;
use crate::locks::PathLocks;
use crate::types::RunnerSettings;

pub mod file;
pub mod mcp;
pub mod shell;

/// Everything a handler may touch besides its own context
#[derive(Clone)]
pub struct HandlerEnv {
    pub runtime: Arc<dyn SandboxRuntime>,
    pub tools: Arc<dyn ToolInvoker>,
    pub settings: RunnerSettings,
    pub path_locks: Option<Arc<PathLocks>>,
}

pub async fn run_action(
    ctx: &ActionContext,
    env: &HandlerEnv,
    action: &ActionData,
) -> Result<(), ActionError> {
    match action {
        ActionData::Shell { content } => shell::run_shell(ctx, env, content).await,
        ActionData::File { content, file_path } => {
            file::run_file(ctx, env, file_path, content).await
        }
        ActionData::McpTool {
            content,
            server_name,
            tool_name,
        } => mcp::run_mcp_tool(ctx, env, server_name, tool_name, content).await,
    }
}
