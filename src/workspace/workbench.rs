//! Workbench task folders.
//!
//! Each task gets its own folder under `workbench/`, carrying a `_TASK.md`
//! metadata file. User-requested tasks are prefixed with the date,
//! agent-initiated ones additionally with a robot marker. Finished tasks
//! move to `workbench/_archive/`.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::WorkspaceError;
use crate::workspace::Workspace;

/// Who asked for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSource {
    User,
    Agent,
}

impl TaskSource {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("agent") {
            TaskSource::Agent
        } else {
            TaskSource::User
        }
    }
}

/// Task lifecycle state, recorded in `_TASK.md`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    InProgress,
    Completed,
    Archived,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "archived" => Some(TaskStatus::Archived),
            _ => None,
        }
    }
}

/// A task folder listing entry.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    pub name: String,
    pub path: PathBuf,
    pub agent_initiated: bool,
}

const TASK_FILE: &str = "_TASK.md";
const AGENT_PREFIX: &str = "🤖_";
const FILES_PLACEHOLDER: &str = "_(files used in this task will be listed here)_";

/// Create a new task folder with its `_TASK.md`, returning the folder path.
pub async fn create_task_folder(
    workspace: &Workspace,
    task_name: &str,
    source: TaskSource,
    description: Option<&str>,
) -> Result<PathBuf, WorkspaceError> {
    let date_prefix = Utc::now().format("%Y-%m-%d");
    let sanitized: String = task_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .take(60)
        .collect();
    let folder_name = match source {
        TaskSource::Agent => format!("{}{}_{}", AGENT_PREFIX, date_prefix, sanitized),
        TaskSource::User => format!("{}_{}", date_prefix, sanitized),
    };

    let task_dir = workspace.workbench_dir().join(folder_name);
    tokio::fs::create_dir_all(&task_dir).await?;

    let mut lines = vec![
        format!("# Task: {}", task_name),
        String::new(),
        "- **Status:** in_progress".to_string(),
        format!("- **Created:** {}", Utc::now().to_rfc3339()),
        format!(
            "- **Source:** {}",
            match source {
                TaskSource::Agent => "🤖 Agent-initiated",
                TaskSource::User => "👤 User request",
            }
        ),
    ];
    if let Some(description) = description {
        lines.push(format!("- **Description:** {}", description));
    }
    lines.extend([
        String::new(),
        "## Files".to_string(),
        String::new(),
        FILES_PLACEHOLDER.to_string(),
    ]);

    tokio::fs::write(task_dir.join(TASK_FILE), lines.join("\n") + "\n").await?;
    Ok(task_dir)
}

/// Rewrite the status line in a task's `_TASK.md`. Missing metadata is not
/// an error — the folder may predate the convention.
pub async fn update_task_status(task_dir: &Path, status: TaskStatus) -> Result<(), WorkspaceError> {
    let task_md = task_dir.join(TASK_FILE);
    let Ok(content) = tokio::fs::read_to_string(&task_md).await else {
        return Ok(());
    };

    let updated = content
        .lines()
        .map(|line| {
            if line.starts_with("- **Status:**") {
                format!("- **Status:** {}", status.as_str())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    tokio::fs::write(&task_md, updated + "\n").await?;
    Ok(())
}

/// Move a task folder into `workbench/_archive/`, stamping it archived.
pub async fn archive_task(
    workspace: &Workspace,
    task_dir: &Path,
) -> Result<PathBuf, WorkspaceError> {
    let archive_dir = workspace.archive_dir();
    tokio::fs::create_dir_all(&archive_dir).await?;

    update_task_status(task_dir, TaskStatus::Archived).await?;

    let folder_name = task_dir
        .file_name()
        .ok_or_else(|| WorkspaceError::NotFound {
            path: task_dir.display().to_string(),
        })?;
    let dest = archive_dir.join(folder_name);
    tokio::fs::rename(task_dir, &dest).await?;
    Ok(dest)
}

/// List task folders in the workbench, excluding `_archive`.
pub async fn list_tasks(workspace: &Workspace) -> Vec<TaskEntry> {
    let mut tasks = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(workspace.workbench_dir()).await else {
        return tasks;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir || name == "_archive" {
            continue;
        }
        tasks.push(TaskEntry {
            agent_initiated: name.starts_with(AGENT_PREFIX),
            path: entry.path(),
            name,
        });
    }
    tasks.sort_by(|a, b| a.name.cmp(&b.name));
    tasks
}

/// Copy a file into a task folder and record it in `_TASK.md`.
pub async fn copy_into_task(source: &Path, task_dir: &Path) -> Result<PathBuf, WorkspaceError> {
    let file_name = source.file_name().ok_or_else(|| WorkspaceError::NotFound {
        path: source.display().to_string(),
    })?;
    let dest = task_dir.join(file_name);
    tokio::fs::copy(source, &dest).await?;

    // Record the copy in the task metadata if the placeholder is still there.
    let task_md = task_dir.join(TASK_FILE);
    if let Ok(content) = tokio::fs::read_to_string(&task_md).await {
        let entry = format!("- `{}`", file_name.to_string_lossy());
        let updated = if content.contains(FILES_PLACEHOLDER) {
            content.replace(FILES_PLACEHOLDER, &entry)
        } else {
            format!("{}\n{}", content.trim_end(), entry)
        };
        tokio::fs::write(&task_md, updated + "\n").await?;
    }

    Ok(dest)
}
