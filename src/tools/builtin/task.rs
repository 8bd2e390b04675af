//! Workbench task tools: create, update status, archive.

use async_trait::async_trait;

use crate::tools::tool::{optional_str, required_str, Tool, ToolError};
use crate::workspace::workbench::{self, TaskSource, TaskStatus};
use crate::workspace::Workspace;

/// Create a new task folder in the workbench.
pub struct CreateTaskTool {
    workspace: Workspace,
}

impl CreateTaskTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CreateTaskTool {
    fn name(&self) -> &str {
        "create_task"
    }

    fn description(&self) -> &str {
        "Create a new task folder in the workbench. Each task gets its own folder with a \
         _TASK.md metadata file. User-requested tasks get a date prefix. Agent-initiated tasks \
         get a 🤖 prefix."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Short descriptive name for the task"
                },
                "description": {
                    "type": "string",
                    "description": "Brief description of what this task will accomplish"
                },
                "source": {
                    "type": "string",
                    "enum": ["user", "agent"],
                    "description": "'user' for user-requested tasks, 'agent' for self-initiated tasks"
                }
            },
            "required": ["name", "source"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let name = required_str(&params, "name")?;
        let source = TaskSource::parse(optional_str(&params, "source").unwrap_or("user"));
        let description = optional_str(&params, "description");

        let task_dir =
            workbench::create_task_folder(&self.workspace, name, source, description).await?;
        let relative = task_dir
            .strip_prefix(self.workspace.root())
            .unwrap_or(&task_dir)
            .display();
        Ok(format!("Task created: {}", relative))
    }
}

/// Update the status recorded in a task's `_TASK.md`.
pub struct UpdateTaskStatusTool {
    workspace: Workspace,
}

impl UpdateTaskStatusTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for UpdateTaskStatusTool {
    fn name(&self) -> &str {
        "update_task_status"
    }

    fn description(&self) -> &str {
        "Update the status of a task in the workbench."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_folder": {
                    "type": "string",
                    "description": "Name of the task folder in workbench/"
                },
                "status": {
                    "type": "string",
                    "enum": ["in_progress", "completed", "archived"],
                    "description": "New status for the task"
                }
            },
            "required": ["task_folder", "status"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let task_folder = required_str(&params, "task_folder")?;
        let status_str = required_str(&params, "status")?;
        let status = TaskStatus::parse(status_str).ok_or_else(|| {
            ToolError::InvalidParameters(format!("unknown status '{}'", status_str))
        })?;

        let task_dir = self
            .workspace
            .resolve(&format!("workbench/{}", task_folder))?;

        // Archiving is a move, not just a status edit.
        if status == TaskStatus::Archived {
            let dest = workbench::archive_task(&self.workspace, &task_dir).await?;
            let relative = dest
                .strip_prefix(self.workspace.root())
                .unwrap_or(&dest)
                .display();
            return Ok(format!("Task archived to: {}", relative));
        }

        workbench::update_task_status(&task_dir, status).await?;
        Ok(format!(
            "Task '{}' status updated to: {}",
            task_folder,
            status.as_str()
        ))
    }
}

/// Move a completed task folder to `workbench/_archive/`.
pub struct ArchiveTaskTool {
    workspace: Workspace,
}

impl ArchiveTaskTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ArchiveTaskTool {
    fn name(&self) -> &str {
        "archive_task"
    }

    fn description(&self) -> &str {
        "Move a completed task folder to the _archive/ directory."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_folder": {
                    "type": "string",
                    "description": "Name of the task folder to archive"
                }
            },
            "required": ["task_folder"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let task_folder = required_str(&params, "task_folder")?;
        let task_dir = self
            .workspace
            .resolve(&format!("workbench/{}", task_folder))?;
        let dest = workbench::archive_task(&self.workspace, &task_dir).await?;
        let relative = dest
            .strip_prefix(self.workspace.root())
            .unwrap_or(&dest)
            .display();
        Ok(format!("Task archived to: {}", relative))
    }
}
