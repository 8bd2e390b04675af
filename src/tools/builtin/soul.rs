//! Soul tools: let the agent evolve its own SOUL.md and IDENTITY.md, and
//! finish the first-run bootstrap.

use async_trait::async_trait;

use crate::agent::soul;
use crate::tools::tool::{required_str, Tool, ToolError};
use crate::workspace::Workspace;

/// Rewrite SOUL.md.
pub struct UpdateSoulTool {
    workspace: Workspace,
}

impl UpdateSoulTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for UpdateSoulTool {
    fn name(&self) -> &str {
        "update_soul"
    }

    fn description(&self) -> &str {
        "Update your SOUL.md file. IMPORTANT: Always tell the user when you modify this file — \
         it's your soul, and they should know."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "New content for SOUL.md"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let content = required_str(&params, "content")?;
        soul::save_soul(&self.workspace, content).await?;
        Ok(
            "SOUL.md updated. (Remember to tell the user about this change — it's your soul.)"
                .to_string(),
        )
    }
}

/// Rewrite IDENTITY.md.
pub struct UpdateIdentityTool {
    workspace: Workspace,
}

impl UpdateIdentityTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for UpdateIdentityTool {
    fn name(&self) -> &str {
        "update_identity"
    }

    fn description(&self) -> &str {
        "Update your IDENTITY.md file with your name, creature type, vibe, and emoji."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "New content for IDENTITY.md"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let content = required_str(&params, "content")?;
        soul::save_identity(&self.workspace, content).await?;
        Ok("IDENTITY.md updated.".to_string())
    }
}

/// Delete BOOTSTRAP.md, marking first-run setup as done.
pub struct CompleteBootstrapTool {
    workspace: Workspace,
}

impl CompleteBootstrapTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CompleteBootstrapTool {
    fn name(&self) -> &str {
        "complete_bootstrap"
    }

    fn description(&self) -> &str {
        "Delete BOOTSTRAP.md to signal that the first-run setup is complete. Only call this \
         after you've established your identity and updated IDENTITY.md."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<String, ToolError> {
        soul::complete_bootstrap(&self.workspace).await?;
        Ok(
            "Bootstrap completed. BOOTSTRAP.md has been deleted. You are now fully initialized."
                .to_string(),
        )
    }
}
