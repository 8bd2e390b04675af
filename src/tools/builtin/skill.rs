//! Skill tools: read, create and update SKILL.md capability files.

use async_trait::async_trait;

use crate::skills;
use crate::tools::tool::{required_str, Tool, ToolError};
use crate::workspace::Workspace;

/// Read the full SKILL.md of one skill.
pub struct ReadSkillTool {
    workspace: Workspace,
}

impl ReadSkillTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadSkillTool {
    fn name(&self) -> &str {
        "read_skill"
    }

    fn description(&self) -> &str {
        "Read the full SKILL.md content of a specific skill to understand how to use it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_path": {
                    "type": "string",
                    "description": "Path to the SKILL.md file"
                }
            },
            "required": ["skill_path"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let skill_path = required_str(&params, "skill_path")?;
        Ok(skills::read_skill_content(&self.workspace, skill_path).await?)
    }
}

/// Create a new skill folder with its SKILL.md.
pub struct CreateSkillTool {
    workspace: Workspace,
}

impl CreateSkillTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CreateSkillTool {
    fn name(&self) -> &str {
        "create_skill"
    }

    fn description(&self) -> &str {
        "Create a new skill. Provide the skill name and complete SKILL.md content (with YAML \
         frontmatter). This creates a skills/<name>/SKILL.md file and logs the action to \
         SKILL_LOG.md. Use this to accumulate capabilities over time — every useful pattern you \
         learn can become a skill."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "Short kebab-case name (e.g. 'pdf-summary', 'code-review')"
                },
                "content": {
                    "type": "string",
                    "description": "Complete SKILL.md content, including YAML frontmatter with name and description"
                },
                "summary": {
                    "type": "string",
                    "description": "One-line summary of this skill for the changelog"
                }
            },
            "required": ["skill_name", "content", "summary"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let skill_name = required_str(&params, "skill_name")?;
        let content = required_str(&params, "content")?;
        let summary = required_str(&params, "summary")?;

        skills::create_skill(&self.workspace, skill_name, content, summary).await?;
        Ok(format!(
            "Skill created: skills/{}/SKILL.md (logged to SKILL_LOG.md)",
            skill_name
        ))
    }
}

/// Update an existing skill's SKILL.md.
pub struct UpdateSkillTool {
    workspace: Workspace,
}

impl UpdateSkillTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for UpdateSkillTool {
    fn name(&self) -> &str {
        "update_skill"
    }

    fn description(&self) -> &str {
        "Update an existing skill's SKILL.md content. Logs the modification to SKILL_LOG.md."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "Name of the skill folder to update"
                },
                "content": {
                    "type": "string",
                    "description": "Updated SKILL.md content"
                },
                "summary": {
                    "type": "string",
                    "description": "One-line summary of what changed for the changelog"
                }
            },
            "required": ["skill_name", "content", "summary"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let skill_name = required_str(&params, "skill_name")?;
        let content = required_str(&params, "content")?;
        let summary = required_str(&params, "summary")?;

        skills::update_skill(&self.workspace, skill_name, content, summary).await?;
        Ok(format!("Skill updated: skills/{}/SKILL.md", skill_name))
    }
}
