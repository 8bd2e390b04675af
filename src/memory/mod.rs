//! Index-based memory: markdown files under `memory/`, catalogued by
//! MEMORY_INDEX.md so the model can find them without loading everything.
//!
//! Dated files (`YYYY-MM-DD.md`) are diary entries listed under `## Recent`;
//! everything else is evergreen knowledge.

use regex::Regex;

use crate::error::WorkspaceError;
use crate::workspace::Workspace;

const EVERGREEN_SECTION: &str = "## Evergreen Knowledge";
const RECENT_SECTION: &str = "## Recent";

/// Load the full MEMORY_INDEX.md content, empty when absent.
pub async fn load_memory_index(workspace: &Workspace) -> String {
    tokio::fs::read_to_string(workspace.memory_index_path())
        .await
        .unwrap_or_default()
}

/// Read one memory file by name, confined to `memory/`.
pub async fn read_memory_file(
    workspace: &Workspace,
    file_name: &str,
) -> Result<String, WorkspaceError> {
    let path = workspace.resolve(&format!("memory/{}", file_name))?;
    if !workspace.is_memory_path(&path) {
        return Err(WorkspaceError::AccessDenied {
            path: file_name.to_string(),
        });
    }
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| WorkspaceError::NotFound {
            path: file_name.to_string(),
        })
}

/// Write a memory file and upsert its index entry.
pub async fn write_memory_file(
    workspace: &Workspace,
    file_name: &str,
    content: &str,
    summary: &str,
) -> Result<(), WorkspaceError> {
    let path = workspace.resolve(&format!("memory/{}", file_name))?;
    if !workspace.is_memory_path(&path) {
        return Err(WorkspaceError::AccessDenied {
            path: file_name.to_string(),
        });
    }

    tokio::fs::create_dir_all(workspace.memory_dir()).await?;
    tokio::fs::write(&path, content).await?;
    update_memory_index(workspace, file_name, summary).await
}

/// Delete a memory file and drop its index entry.
pub async fn delete_memory_file(
    workspace: &Workspace,
    file_name: &str,
) -> Result<(), WorkspaceError> {
    let path = workspace.resolve(&format!("memory/{}", file_name))?;
    if !workspace.is_memory_path(&path) {
        return Err(WorkspaceError::AccessDenied {
            path: file_name.to_string(),
        });
    }
    let _ = tokio::fs::remove_file(&path).await;

    let index_path = workspace.memory_index_path();
    if let Ok(index) = tokio::fs::read_to_string(&index_path).await {
        let line = entry_line_regex(file_name);
        let updated = line.replace(&index, "").to_string();
        tokio::fs::write(&index_path, updated).await?;
    }
    Ok(())
}

/// List memory files (excluding the index itself).
pub async fn list_memory_files(workspace: &Workspace) -> Vec<String> {
    let mut files = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(workspace.memory_dir()).await else {
        return files;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".md") && name != "MEMORY_INDEX.md" {
            files.push(name);
        }
    }
    files.sort();
    files
}

/// Upsert one `- [name](file) — summary` line into the index, choosing the
/// section by filename shape.
async fn update_memory_index(
    workspace: &Workspace,
    file_name: &str,
    summary: &str,
) -> Result<(), WorkspaceError> {
    let index_path = workspace.memory_index_path();
    let mut index = tokio::fs::read_to_string(&index_path)
        .await
        .unwrap_or_else(|_| {
            format!(
                "# Memory Index\n\n{}\n\n{}\n",
                EVERGREEN_SECTION, RECENT_SECTION
            )
        });

    let display_name = file_name.strip_suffix(".md").unwrap_or(file_name);
    let entry = format!("- [{}]({}) — {}", display_name, file_name, summary);
    let existing = entry_line_regex(file_name);

    if existing.is_match(&index) {
        // NoExpand: summaries may contain `$`, which is not a capture ref.
        let replacement = format!("{}\n", entry);
        index = existing
            .replace(&index, regex::NoExpand(&replacement))
            .to_string();
    } else {
        let dated = Regex::new(r"^\d{4}-\d{2}-\d{2}\.md$").expect("static regex");
        let section = if dated.is_match(file_name) {
            RECENT_SECTION
        } else {
            EVERGREEN_SECTION
        };

        index = match index.find(section) {
            Some(pos) => {
                // Insert directly under the section header.
                let after_header = index[pos..]
                    .find('\n')
                    .map(|offset| pos + offset + 1)
                    .unwrap_or(index.len());
                let mut updated = String::with_capacity(index.len() + entry.len() + 2);
                updated.push_str(&index[..after_header]);
                updated.push_str(&entry);
                updated.push('\n');
                updated.push_str(&index[after_header..]);
                updated
            }
            None => format!("{}\n{}\n", index.trim_end(), entry),
        };
    }

    tokio::fs::write(&index_path, index).await?;
    Ok(())
}

/// Matches the full index line (and its newline) for one file.
fn entry_line_regex(file_name: &str) -> Regex {
    Regex::new(&format!(
        r"(?m)^- \[[^\]]*\]\({}\).*\n?",
        regex::escape(file_name)
    ))
    .expect("escaped filename regex")
}
