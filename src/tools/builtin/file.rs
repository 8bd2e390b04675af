//! File tools: reading, writing and listing inside the workspace.
//!
//! All paths are workspace-relative and confined to the workspace root.
//! `user/` is read-only; processing a user file means copying it into a
//! workbench task folder first.

use async_trait::async_trait;

use crate::tools::tool::{required_str, Tool, ToolError};
use crate::workspace::workbench;
use crate::workspace::{document, Workspace};

/// Read any workspace file, going through the document reader so office
/// formats degrade into placeholders instead of raw bytes.
pub struct ReadFileTool {
    workspace: Workspace,
}

impl ReadFileTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read file contents. Can read files from user/ (read-only), memory/, workbench/, and \
         skills/ directories. Supports text files; binary documents (PDF, Word, Excel) are \
         reported by type. For user/ files, content is read-only — use copy_to_workbench to \
         work with copies."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the workspace root (e.g. 'user/resume.pdf', 'memory/preferences.md', 'workbench/task/result.md')"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let path = required_str(&params, "path")?;
        let resolved = self.workspace.resolve(path)?;
        Ok(document::parse_document(&resolved).await?)
    }
}

/// Write a file into `memory/` or `workbench/`. The `user/` folder is
/// refused.
pub struct WriteFileTool {
    workspace: Workspace,
}

impl WriteFileTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. ONLY allowed in memory/ and workbench/ directories. Cannot \
         write to user/ (read-only). Creates parent directories if needed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to workspace root (e.g. 'workbench/my-task/output.md', 'memory/notes.md')"
                },
                "content": {
                    "type": "string",
                    "description": "File content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let path = required_str(&params, "path")?;
        let content = required_str(&params, "content")?;

        let resolved = self.workspace.resolve(path)?;
        if self.workspace.is_user_path(&resolved) {
            return Err(ToolError::NotAuthorized(
                "cannot write to user/ — it is read-only. Use copy_to_workbench to copy files, \
                 then edit copies in workbench/."
                    .to_string(),
            ));
        }

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;
        Ok(format!("File written: {}", path))
    }
}

/// List a workspace directory.
pub struct ListDirTool {
    workspace: Workspace,
}

impl ListDirTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List contents of a directory. Works in user/, memory/, workbench/, and skills/."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to workspace root (e.g. 'user/', 'workbench/', 'memory/')"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let path = required_str(&params, "path")?;
        let resolved = self.workspace.resolve(path)?;

        let mut entries = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|_| ToolError::ExecutionFailed(format!("Directory not found: {}", path)))?;

        let mut lines = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let file_type = entry.file_type().await;
            if file_type.map(|t| t.is_dir()).unwrap_or(false) {
                lines.push(format!("📁 {}/", name));
            } else {
                let size_kb = entry
                    .metadata()
                    .await
                    .map(|m| m.len() as f64 / 1024.0)
                    .unwrap_or(0.0);
                lines.push(format!("📄 {} ({:.1} KB)", name, size_kb));
            }
        }
        lines.sort();

        if lines.is_empty() {
            Ok("(empty directory)".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}

/// Copy a file from `user/` into an existing workbench task folder.
pub struct CopyToWorkbenchTool {
    workspace: Workspace,
}

impl CopyToWorkbenchTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CopyToWorkbenchTool {
    fn name(&self) -> &str {
        "copy_to_workbench"
    }

    fn description(&self) -> &str {
        "Copy a file from user/ folder into a specific task folder in workbench/. Use this when \
         you need to process or modify a user file — always work on the copy, never the original."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "Source file path relative to workspace (must be in user/)"
                },
                "task_folder": {
                    "type": "string",
                    "description": "Name of the task folder in workbench/ to copy into"
                }
            },
            "required": ["source_path", "task_folder"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let source_path = required_str(&params, "source_path")?;
        let task_folder = required_str(&params, "task_folder")?;

        let source = self.workspace.resolve(source_path)?;
        if !self.workspace.is_user_path(&source) {
            return Err(ToolError::NotAuthorized(
                "copy_to_workbench only works for files in user/ folder".to_string(),
            ));
        }

        let task_dir = self
            .workspace
            .resolve(&format!("workbench/{}", task_folder))?;
        if !task_dir.is_dir() {
            return Err(ToolError::ExecutionFailed(format!(
                "Task folder '{}' does not exist. Create it first with create_task.",
                task_folder
            )));
        }

        let dest = workbench::copy_into_task(&source, &task_dir).await?;
        let relative = dest
            .strip_prefix(self.workspace.root())
            .unwrap_or(&dest)
            .display();
        Ok(format!("Copied to: {}", relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fixture() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();
        (dir, ws)
    }

    #[tokio::test]
    async fn test_read_and_write_roundtrip() {
        let (_dir, ws) = fixture().await;
        let write = WriteFileTool::new(ws.clone());
        let read = ReadFileTool::new(ws.clone());

        let message = write
            .execute(serde_json::json!({"path": "workbench/t/out.md", "content": "# Out"}))
            .await
            .unwrap();
        assert_eq!(message, "File written: workbench/t/out.md");

        let content = read
            .execute(serde_json::json!({"path": "workbench/t/out.md"}))
            .await
            .unwrap();
        assert_eq!(content, "# Out");
    }

    #[tokio::test]
    async fn test_write_into_user_refused() {
        let (_dir, ws) = fixture().await;
        let write = WriteFileTool::new(ws.clone());

        let err = write
            .execute(serde_json::json!({"path": "user/hack.md", "content": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAuthorized(_)));
        assert!(!ws.user_dir().join("hack.md").exists());
    }

    #[tokio::test]
    async fn test_path_traversal_refused() {
        let (_dir, ws) = fixture().await;
        let read = ReadFileTool::new(ws.clone());
        let err = read
            .execute(serde_json::json!({"path": "../../etc/passwd"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAuthorized(_)));
    }

    #[tokio::test]
    async fn test_list_dir() {
        let (_dir, ws) = fixture().await;
        tokio::fs::write(ws.user_dir().join("notes.txt"), "hello")
            .await
            .unwrap();
        tokio::fs::create_dir(ws.user_dir().join("sub")).await.unwrap();
        tokio::fs::write(ws.user_dir().join(".hidden"), "x")
            .await
            .unwrap();

        let list = ListDirTool::new(ws.clone());
        let out = list
            .execute(serde_json::json!({"path": "user/"}))
            .await
            .unwrap();
        assert!(out.contains("📁 sub/"));
        assert!(out.contains("📄 notes.txt"));
        assert!(!out.contains(".hidden"));

        let missing = list
            .execute(serde_json::json!({"path": "user/void"}))
            .await
            .unwrap_err();
        assert!(matches!(missing, ToolError::ExecutionFailed(_)));
    }

    #[tokio::test]
    async fn test_copy_to_workbench_requires_user_source_and_task() {
        let (_dir, ws) = fixture().await;
        tokio::fs::write(ws.user_dir().join("data.csv"), "a,b")
            .await
            .unwrap();
        let copy = CopyToWorkbenchTool::new(ws.clone());

        // Task folder must already exist.
        let err = copy
            .execute(serde_json::json!({"source_path": "user/data.csv", "task_folder": "none"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));

        let task = workbench::create_task_folder(
            &ws,
            "crunch",
            workbench::TaskSource::User,
            None,
        )
        .await
        .unwrap();
        let folder = task.file_name().unwrap().to_string_lossy().to_string();

        let ok = copy
            .execute(serde_json::json!({"source_path": "user/data.csv", "task_folder": folder.as_str()}))
            .await
            .unwrap();
        assert!(ok.starts_with("Copied to: workbench/"));

        // Only user/ sources are allowed.
        let err = copy
            .execute(serde_json::json!({
                "source_path": "memory/MEMORY_INDEX.md",
                "task_folder": folder.as_str()
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotAuthorized(_)));
    }
}
