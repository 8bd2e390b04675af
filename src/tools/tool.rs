//! Tool trait and error type.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::ToolDefinition;

/// Error type for tool execution. Never crosses the registry boundary —
/// the dispatcher folds it into the textual tool result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::ExecutionFailed(err.to_string())
    }
}

impl From<crate::error::WorkspaceError> for ToolError {
    fn from(err: crate::error::WorkspaceError) -> Self {
        match err {
            crate::error::WorkspaceError::AccessDenied { path } => {
                ToolError::NotAuthorized(format!("path is outside its allowed folder: {}", path))
            }
            other => ToolError::ExecutionFailed(other.to_string()),
        }
    }
}

/// Trait for tools the agent can call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get a description of what the tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with already-parsed parameters.
    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError>;

    /// The definition sent to the model for function calling.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Pull a required string parameter out of a params object.
pub(crate) fn required_str<'a>(
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}' parameter", key)))
}

/// Pull an optional string parameter.
pub(crate) fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// A simple no-op tool for testing.
#[derive(Debug, Default)]
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the input message. Useful for testing."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo back"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let message = required_str(&params, "message")?;
        Ok(message.to_string())
    }
}
