//! Soul files: SOUL.md, IDENTITY.md and the one-shot BOOTSTRAP.md.

use regex::Regex;

use crate::error::WorkspaceError;
use crate::workspace::Workspace;

/// Parsed fields from IDENTITY.md. Placeholder values are skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub creature: Option<String>,
    pub vibe: Option<String>,
    pub emoji: Option<String>,
}

pub async fn load_soul(workspace: &Workspace) -> Option<String> {
    tokio::fs::read_to_string(workspace.soul_dir().join("SOUL.md"))
        .await
        .ok()
}

pub async fn save_soul(workspace: &Workspace, content: &str) -> Result<(), WorkspaceError> {
    tokio::fs::create_dir_all(workspace.soul_dir()).await?;
    tokio::fs::write(workspace.soul_dir().join("SOUL.md"), content).await?;
    Ok(())
}

pub async fn load_identity(workspace: &Workspace) -> Option<String> {
    tokio::fs::read_to_string(workspace.soul_dir().join("IDENTITY.md"))
        .await
        .ok()
}

pub async fn save_identity(workspace: &Workspace, content: &str) -> Result<(), WorkspaceError> {
    tokio::fs::create_dir_all(workspace.soul_dir()).await?;
    tokio::fs::write(workspace.soul_dir().join("IDENTITY.md"), content).await?;
    Ok(())
}

pub async fn load_bootstrap(workspace: &Workspace) -> Option<String> {
    tokio::fs::read_to_string(workspace.soul_dir().join("BOOTSTRAP.md"))
        .await
        .ok()
}

/// BOOTSTRAP.md present means the getting-to-know-you flow hasn't finished.
pub async fn is_first_run(workspace: &Workspace) -> bool {
    workspace.soul_dir().join("BOOTSTRAP.md").exists()
}

/// Delete BOOTSTRAP.md; idempotent.
pub async fn complete_bootstrap(workspace: &Workspace) -> Result<(), WorkspaceError> {
    let path = workspace.soul_dir().join("BOOTSTRAP.md");
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Extract `**Field:** value` lines from IDENTITY.md, ignoring the
/// `_( … )_` placeholders of the unfilled template.
pub fn parse_identity(content: &str) -> Identity {
    let field = |name: &str| -> Option<String> {
        let re = Regex::new(&format!(r"\*\*{}:\*\*\s*(.+)", name)).expect("static regex");
        re.captures(content)
            .map(|c| c[1].trim().to_string())
            .filter(|v| !v.contains("_("))
    };

    Identity {
        name: field("Name"),
        creature: field("Creature"),
        vibe: field("Vibe"),
        emoji: field("Emoji"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();

        assert!(is_first_run(&ws).await);
        complete_bootstrap(&ws).await.unwrap();
        assert!(!is_first_run(&ws).await);
        // Second completion is a no-op.
        complete_bootstrap(&ws).await.unwrap();
    }

    #[tokio::test]
    async fn test_soul_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();

        save_soul(&ws, "# My Soul\nbe kind").await.unwrap();
        assert_eq!(load_soul(&ws).await.unwrap(), "# My Soul\nbe kind");
    }

    #[test]
    fn test_parse_identity() {
        let content = "# Identity\n\n- **Name:** Shrimp\n- **Creature:** tide-pool spirit\n- **Vibe:** calm and curious\n- **Emoji:** 🦐\n";
        let identity = parse_identity(content);
        assert_eq!(identity.name.as_deref(), Some("Shrimp"));
        assert_eq!(identity.creature.as_deref(), Some("tide-pool spirit"));
        assert_eq!(identity.emoji.as_deref(), Some("🦐"));
    }

    #[test]
    fn test_parse_identity_skips_placeholders() {
        let content = "- **Name:** _(choose one during bootstrap)_\n- **Vibe:** direct\n";
        let identity = parse_identity(content);
        assert_eq!(identity.name, None);
        assert_eq!(identity.vibe.as_deref(), Some("direct"));
    }
}
