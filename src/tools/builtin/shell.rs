//! Shell execution tool.
//!
//! Commands run on the host with a timeout and truncated output capture.
//! The working directory defaults to the workbench so stray output files
//! land somewhere the agent may write.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::tools::tool::{optional_str, required_str, Tool, ToolError};
use crate::workspace::Workspace;

/// Maximum captured output per stream before truncation (64KB).
const MAX_OUTPUT_SIZE: usize = 64 * 1024;

/// Default command timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shell command execution tool.
pub struct ExecTool {
    workspace: Workspace,
    timeout: Duration,
}

impl ExecTool {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Tool for ExecTool {
    fn name(&self) -> &str {
        "exec"
    }

    fn description(&self) -> &str {
        "Execute a shell command. Use responsibly — prefer file tools for reading/writing. \
         Useful for running scripts, installing packages, or other system operations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory (relative to workspace root, defaults to workbench/)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, params: serde_json::Value) -> Result<String, ToolError> {
        let command = required_str(&params, "command")?;
        let cwd = match optional_str(&params, "cwd") {
            Some(cwd) => self.workspace.resolve(cwd)?,
            None => self.workspace.workbench_dir(),
        };

        tracing::debug!(%command, cwd = %cwd.display(), "Executing shell command");

        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::ExecutionFailed(format!("failed to spawn: {}", e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout(self.timeout))?
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let stdout = truncate_output(&String::from_utf8_lossy(&output.stdout));
        let stderr = truncate_output(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Ok(format!(
                "Command failed: exit status {}\n{}",
                code,
                if stderr.is_empty() { stdout } else { stderr }
            )
            .trim_end()
            .to_string());
        }

        let mut sections = Vec::new();
        if !stdout.trim().is_empty() {
            sections.push(format!("stdout:\n{}", stdout.trim()));
        }
        if !stderr.trim().is_empty() {
            sections.push(format!("stderr:\n{}", stderr.trim()));
        }

        if sections.is_empty() {
            Ok("(no output)".to_string())
        } else {
            Ok(sections.join("\n\n"))
        }
    }
}

fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    let mut cut = MAX_OUTPUT_SIZE;
    while !output.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\n… (output truncated)", &output[..cut])
}
