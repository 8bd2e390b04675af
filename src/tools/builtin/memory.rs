//! Memory tools: indexed read/write over `memory/`.

use async_trait::async_trait;

use crate::memory;
use crate::tools::tool::{required_str, Tool, ToolError};
use crate::workspace::Workspace;

/// Read one memory file.
pub struct MemoryReadTool {
    workspace: Workspace,
}

impl MemoryReadTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for MemoryReadTool {
    fn name(&self) -> &str {
        "memory_read"
    }

    fn description(&self) -> &str {
        "Read a specific memory file. Check MEMORY_INDEX.md first to find relevant files."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_name": {
                    "type": "string",
                    "description": "Memory file name (e.g. 'preferences.md', '2026-02-23.md')"
                }
            },
            "required": ["file_name"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let file_name = required_str(&params, "file_name")?;
        Ok(memory::read_memory_file(&self.workspace, file_name).await?)
    }
}

/// Write a memory file and keep the index current.
pub struct MemoryWriteTool {
    workspace: Workspace,
}

impl MemoryWriteTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for MemoryWriteTool {
    fn name(&self) -> &str {
        "memory_write"
    }

    fn description(&self) -> &str {
        "Write or update a memory file. Automatically updates MEMORY_INDEX.md. Use date format \
         (YYYY-MM-DD.md) for diary entries, descriptive names for evergreen knowledge."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_name": {
                    "type": "string",
                    "description": "Memory file name (e.g. 'preferences.md', '2026-02-23.md')"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write to the memory file"
                },
                "summary": {
                    "type": "string",
                    "description": "One-line summary for the MEMORY_INDEX.md entry"
                }
            },
            "required": ["file_name", "content", "summary"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let file_name = required_str(&params, "file_name")?;
        let content = required_str(&params, "content")?;
        let summary = required_str(&params, "summary")?;

        memory::write_memory_file(&self.workspace, file_name, content, summary).await?;
        Ok(format!("Memory written: {} (index updated)", file_name))
    }
}

/// Dump the memory index.
pub struct MemoryIndexTool {
    workspace: Workspace,
}

impl MemoryIndexTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for MemoryIndexTool {
    fn name(&self) -> &str {
        "memory_index"
    }

    fn description(&self) -> &str {
        "View the current memory index (MEMORY_INDEX.md) to see what memories exist."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: serde_json::Value) -> Result<String, ToolError> {
        let index = memory::load_memory_index(&self.workspace).await;
        if index.trim().is_empty() {
            Ok("(Memory index is empty)".to_string())
        } else {
            Ok(index)
        }
    }
}
