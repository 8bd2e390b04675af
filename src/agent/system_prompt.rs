//! System prompt assembly.
//!
//! The prompt is rebuilt once per session from the workspace's soul and
//! identity files, the memory index, the user profile and the discovered
//! skills, in a fixed section order.

use chrono::Utc;

use crate::agent::soul;
use crate::skills;
use crate::workspace::Workspace;

/// Assemble the full system prompt for a session in `workspace`.
pub async fn build_system_prompt(workspace: &Workspace) -> String {
    let soul_text = soul::load_soul(workspace).await;
    let identity = soul::load_identity(workspace).await;
    let bootstrap = soul::load_bootstrap(workspace).await;
    let first_run = soul::is_first_run(workspace).await;
    let memory_index = crate::memory::load_memory_index(workspace).await;
    let user_profile = workspace.load_user_profile().await;
    let skills_block = skills::build_skills_prompt(&skills::load_skills(workspace).await);

    let mut sections: Vec<String> = Vec::new();
    let mut push = |s: &str| sections.push(s.to_string());

    push("You are a personal AI assistant running inside ClawCore.");
    push("");

    if first_run {
        if let Some(bootstrap) = bootstrap {
            push("# 🌱 First Run — Bootstrap Active");
            push("");
            push(&bootstrap);
            push("");
        }
    }

    if let Some(soul_text) = soul_text {
        push("# Soul");
        push("");
        push("If SOUL.md is present, embody its persona and tone. Avoid stiff, generic replies.");
        push("");
        push(&soul_text);
        push("");
    }

    if let Some(identity) = identity {
        push("# Identity");
        push("");
        push(&identity);
        push("");
    }

    push("# Workspace");
    push("");
    push(&format!("Working directory: {}", workspace.root().display()));
    push("");
    push("## Directory Permissions");
    push("- `soul/` — Your soul and identity files. You can read and update them.");
    push(
        "- `user/` — User's personal files. **READ-ONLY**. If you need to process a file, use \
         `copy_to_workbench` to copy it to the workbench first.",
    );
    push("- `memory/` — Your memory files. You can read and write freely.");
    push(
        "- `workbench/` — Task workspace. Each task gets its own folder. You can read and write \
         freely.",
    );
    push("- `skills/` — Available skills. Read-only.");
    push("");

    if let Some(user_profile) = user_profile {
        push("# User Profile");
        push("");
        push(&user_profile);
        push("");
    }

    if !memory_index.trim().is_empty() {
        push("# Memory Index");
        push("");
        push(
            "Before answering anything about prior work, decisions, preferences, or todos: check \
             this index first, then use `memory_read` to load specific files as needed.",
        );
        push("");
        push(&memory_index);
        push("");
    }

    if !skills_block.is_empty() {
        push("# Skills");
        push("");
        push("Before replying, scan the available skills below.");
        push("- If exactly one skill clearly applies: read its SKILL.md with `read_skill`, then follow it.");
        push("- If multiple could apply: choose the most specific one.");
        push("- If none apply: proceed without reading any skill.");
        push("");
        push(&skills_block);
        push("");
    }

    push("# Tool Call Style");
    push("");
    push("Default: do not narrate routine tool calls (just call the tool).");
    push("Narrate only when it helps: multi-step work, complex problems, or sensitive actions.");
    push("");

    push("# Safety");
    push("");
    push("You have no independent goals: do not pursue self-preservation, replication, or power-seeking.");
    push("Prioritize safety and human oversight over task completion.");
    push("If you modify SOUL.md, always tell the user — it's your soul, and they should know.");
    push("");

    push("# Heartbeat Scans");
    push("");
    push("You will periodically receive heartbeat scan messages. When triggered:");
    push("1. Scan `user/` for new or modified files.");
    push("2. Review `workbench/` task statuses.");
    push("3. Check `memory/MEMORY_INDEX.md` for pending items.");
    push("4. If something needs attention, create a new task with `create_task(source='agent')`.");
    push(&format!(
        "5. If nothing needs attention, respond with exactly: {}",
        crate::agent::heartbeat::SCAN_SENTINEL
    ));
    push("");

    push(&format!("Current time: {}", Utc::now().to_rfc3339()));

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prompt_sections_present() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();

        let prompt = build_system_prompt(&ws).await;
        assert!(prompt.contains("# 🌱 First Run — Bootstrap Active"));
        assert!(prompt.contains("# Soul"));
        assert!(prompt.contains("# Workspace"));
        assert!(prompt.contains("**READ-ONLY**"));
        assert!(prompt.contains("# Heartbeat Scans"));
        assert!(prompt.contains("HEARTBEAT_OK"));
    }

    #[tokio::test]
    async fn test_bootstrap_section_gone_after_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();
        soul::complete_bootstrap(&ws).await.unwrap();

        let prompt = build_system_prompt(&ws).await;
        assert!(!prompt.contains("Bootstrap Active"));
    }

    #[tokio::test]
    async fn test_skills_block_injected() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();
        skills::create_skill(
            &ws,
            "code-review",
            "---\nname: code-review\ndescription: Review diffs\n---\nbody",
            "added",
        )
        .await
        .unwrap();

        let prompt = build_system_prompt(&ws).await;
        assert!(prompt.contains("# Skills"));
        assert!(prompt.contains("<skill name=\"code-review\""));
    }
}
