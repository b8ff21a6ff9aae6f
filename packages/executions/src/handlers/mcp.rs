// ABOUTME: Tool-call action handler forwarding JSON arguments to a named tool server
// ABOUTME: Records server, tool, arguments and result in the action transcript

use serde_json::{Map, Value};
use tracing::debug;

use super::HandlerEnv;
use crate::context::ActionContext;
use crate::error::ActionError;

fn parse_arguments(content: &str) -> Result<Map<String, Value>, ActionError> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(args)) => Ok(args),
        Ok(_) => Err(ActionError::Validation(
            "Tool arguments must be a JSON object".to_string(),
        )),
        Err(e) => Err(ActionError::Validation(format!(
            "Invalid tool arguments: {}",
            e
        ))),
    }
}

pub async fn run_mcp_tool(
    ctx: &ActionContext,
    env: &HandlerEnv,
    server_name: &str,
    tool_name: &str,
    content: &str,
) -> Result<(), ActionError> {
    ctx.record(format!("Server: {}", server_name));
    ctx.record(format!("Tool: {}", tool_name));

    let args = parse_arguments(content)?;
    ctx.record(format!("Args: {}", Value::Object(args.clone())));

    debug!("Calling tool {} on {}", tool_name, server_name);
    let response = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Err(ActionError::Aborted),
        response = env.tools.call_tool(server_name, tool_name, args) => {
            response.map_err(|e| ActionError::Execution(e.to_string()))?
        }
    };

    if response.success {
        let data = response.data.unwrap_or(Value::Null);
        ctx.record(format!("Result: {}", data));
        Ok(())
    } else {
        let message = response
            .error
            .unwrap_or_else(|| "Tool call failed".to_string());
        ctx.record(format!("Error: {}", message));
        Err(ActionError::Execution(format!(
            "Tool {} on {} failed: {}",
            tool_name, server_name, message
        )))
    }
}
