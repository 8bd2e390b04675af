//! Skills: `skills/<name>/SKILL.md` capability files with YAML frontmatter.
//!
//! Only name and description are loaded up front; the model reads the full
//! SKILL.md on demand (progressive disclosure). Creating or updating a skill
//! appends a line to `skills/SKILL_LOG.md`.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;

use crate::error::WorkspaceError;
use crate::workspace::Workspace;

const SKILL_FILE: &str = "SKILL.md";
const SKILL_LOG: &str = "SKILL_LOG.md";

/// One discovered skill.
#[derive(Debug, Clone)]
pub struct SkillEntry {
    pub name: String,
    pub description: String,
    /// Path to the SKILL.md file.
    pub location: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct SkillFrontmatter {
    name: Option<String>,
    description: Option<String>,
}

/// Load all skills from the workspace's `skills/` directory.
pub async fn load_skills(workspace: &Workspace) -> Vec<SkillEntry> {
    let mut skills = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(workspace.skills_dir()).await else {
        return skills;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir {
            continue;
        }
        let folder_name = entry.file_name().to_string_lossy().to_string();
        let skill_md = entry.path().join(SKILL_FILE);
        let Ok(content) = tokio::fs::read_to_string(&skill_md).await else {
            continue;
        };

        let frontmatter = parse_frontmatter(&content);
        skills.push(SkillEntry {
            name: frontmatter.name.unwrap_or(folder_name),
            description: frontmatter.description.unwrap_or_default(),
            location: skill_md,
        });
    }

    skills.sort_by(|a, b| a.name.cmp(&b.name));
    skills
}

/// Build the `<available_skills>` prompt block; empty when no skills exist.
pub fn build_skills_prompt(skills: &[SkillEntry]) -> String {
    if skills.is_empty() {
        return String::new();
    }

    let mut lines = vec!["<available_skills>".to_string()];
    for skill in skills {
        lines.push(format!(
            "<skill name=\"{}\" location=\"{}\"><description>{}</description></skill>",
            skill.name,
            skill.location.display(),
            skill.description
        ));
    }
    lines.push("</available_skills>".to_string());
    lines.join("\n")
}

/// Read the full SKILL.md of one skill, confined to the skills directory.
pub async fn read_skill_content(
    workspace: &Workspace,
    skill_path: &str,
) -> Result<String, WorkspaceError> {
    // Accept both workspace-relative and absolute paths from the model.
    let path = match Path::new(skill_path).is_absolute() {
        true => PathBuf::from(skill_path),
        false => workspace.resolve(skill_path)?,
    };
    if !crate::workspace::normalized(&path).starts_with(workspace.skills_dir()) {
        return Err(WorkspaceError::AccessDenied {
            path: skill_path.to_string(),
        });
    }
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|_| WorkspaceError::NotFound {
            path: skill_path.to_string(),
        })
}

/// Create `skills/<name>/SKILL.md` and log the addition.
pub async fn create_skill(
    workspace: &Workspace,
    skill_name: &str,
    content: &str,
    summary: &str,
) -> Result<PathBuf, WorkspaceError> {
    let skill_dir = workspace.skills_dir().join(sanitize_name(skill_name));
    tokio::fs::create_dir_all(&skill_dir).await?;

    let path = skill_dir.join(SKILL_FILE);
    tokio::fs::write(&path, content).await?;
    append_skill_log(workspace, "created", skill_name, summary).await?;
    Ok(path)
}

/// Overwrite an existing skill's SKILL.md and log the change.
pub async fn update_skill(
    workspace: &Workspace,
    skill_name: &str,
    content: &str,
    summary: &str,
) -> Result<(), WorkspaceError> {
    let skill_dir = workspace.skills_dir().join(sanitize_name(skill_name));
    let path = skill_dir.join(SKILL_FILE);
    if !path.exists() {
        return Err(WorkspaceError::NotFound {
            path: format!("skills/{}/SKILL.md", skill_name),
        });
    }
    tokio::fs::write(&path, content).await?;
    append_skill_log(workspace, "updated", skill_name, summary).await?;
    Ok(())
}

/// Parse the YAML block between leading `---` markers, tolerating files
/// without one.
fn parse_frontmatter(content: &str) -> SkillFrontmatter {
    let rest = match content.strip_prefix("---") {
        Some(rest) => rest,
        None => return SkillFrontmatter::default(),
    };
    let Some(end) = rest.find("\n---") else {
        return SkillFrontmatter::default();
    };
    serde_yml::from_str(&rest[..end]).unwrap_or_default()
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

async fn append_skill_log(
    workspace: &Workspace,
    action: &str,
    skill_name: &str,
    summary: &str,
) -> Result<(), WorkspaceError> {
    let log_path = workspace.skills_dir().join(SKILL_LOG);
    let mut log = tokio::fs::read_to_string(&log_path)
        .await
        .unwrap_or_else(|_| "# Skill Log\n".to_string());
    log.push_str(&format!(
        "- {} — {} `{}`: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M"),
        action,
        skill_name,
        summary
    ));
    tokio::fs::write(&log_path, log).await?;
    Ok(())
}
