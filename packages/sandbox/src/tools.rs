// ABOUTME: Tool invoker trait for calling named tools on external tool servers
// ABOUTME: Carries the success/data/error response shape returned by tool servers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool server not available: {0}")]
    ServerUnavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Response from a tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolCallResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Executes named tool calls on named tool servers
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        args: Map<String, Value>,
    ) -> Result<ToolCallResponse, ToolError>;
}

/// Invoker used when no tool transport is configured; every call reports failure
#[derive(Debug, Default, Clone)]
pub struct UnavailableToolInvoker;

#[async_trait]
impl ToolInvoker for UnavailableToolInvoker {
    async fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        _args: Map<String, Value>,
    ) -> Result<ToolCallResponse, ToolError> {
        debug!("No tool transport for {}/{}", server_name, tool_name);
        Ok(ToolCallResponse::failed(format!(
            "No tool server configured for '{}'",
            server_name
        )))
    }
}
