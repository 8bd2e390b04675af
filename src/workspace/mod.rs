//! Workspace layout and first-run initialization.
//!
//! The workspace is a single directory owned by one assistant session:
//!
//! - `soul/` — SOUL.md / IDENTITY.md / BOOTSTRAP.md
//! - `user/` — the user's own files; read-only for the agent
//! - `memory/` — markdown memory files indexed by MEMORY_INDEX.md
//! - `workbench/` — one folder per task, `_archive/` for finished ones
//! - `skills/` — `<name>/SKILL.md` capability files
//!
//! Everything the agent touches goes through [`Workspace::resolve`], which
//! confines paths to the workspace root.

pub mod document;
pub mod workbench;

use std::path::{Component, Path, PathBuf};

use crate::error::WorkspaceError;

const SOUL_TEMPLATE: &str = include_str!("../../templates/SOUL.md");
const IDENTITY_TEMPLATE: &str = include_str!("../../templates/IDENTITY.md");
const BOOTSTRAP_TEMPLATE: &str = include_str!("../../templates/BOOTSTRAP.md");
const USER_PROFILE_TEMPLATE: &str = include_str!("../../templates/USER_PROFILE.md");
const MEMORY_INDEX_TEMPLATE: &str = include_str!("../../templates/MEMORY_INDEX.md");

/// Handle to one assistant workspace on disk.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn soul_dir(&self) -> PathBuf {
        self.root.join("soul")
    }

    pub fn user_dir(&self) -> PathBuf {
        self.root.join("user")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.root.join("memory")
    }

    pub fn workbench_dir(&self) -> PathBuf {
        self.root.join("workbench")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.workbench_dir().join("_archive")
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.root.join("skills")
    }

    pub fn user_profile_path(&self) -> PathBuf {
        self.user_dir().join("USER_PROFILE.md")
    }

    pub fn memory_index_path(&self) -> PathBuf {
        self.memory_dir().join("MEMORY_INDEX.md")
    }

    /// Durable heartbeat scan metadata lives next to the content folders.
    pub fn scan_state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Create the directory layout and seed template files.
    ///
    /// BOOTSTRAP.md is seeded only when the soul directory is created fresh:
    /// its deletion marks first-run completion and must stick across
    /// restarts.
    pub async fn init(&self) -> Result<(), WorkspaceError> {
        let soul_dir = self.soul_dir();
        let first_run = !soul_dir.exists();

        for dir in [
            self.root.clone(),
            soul_dir.clone(),
            self.user_dir(),
            self.memory_dir(),
            self.workbench_dir(),
            self.archive_dir(),
            self.skills_dir(),
        ] {
            tokio::fs::create_dir_all(&dir).await?;
        }

        seed_if_missing(&soul_dir.join("SOUL.md"), SOUL_TEMPLATE).await?;
        seed_if_missing(&soul_dir.join("IDENTITY.md"), IDENTITY_TEMPLATE).await?;
        if first_run {
            seed_if_missing(&soul_dir.join("BOOTSTRAP.md"), BOOTSTRAP_TEMPLATE).await?;
        }
        seed_if_missing(&self.user_profile_path(), USER_PROFILE_TEMPLATE).await?;
        seed_if_missing(&self.memory_index_path(), MEMORY_INDEX_TEMPLATE).await?;

        tracing::debug!(root = %self.root.display(), first_run, "Workspace initialized");
        Ok(())
    }

    /// Resolve a workspace-relative path, refusing anything that escapes the
    /// root (including via `..`).
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, WorkspaceError> {
        let joined = self.root.join(relative);
        let normalized = normalized(&joined);
        if !normalized.starts_with(&self.root) {
            return Err(WorkspaceError::AccessDenied {
                path: relative.to_string(),
            });
        }
        Ok(normalized)
    }

    /// Whether an absolute path is inside the read-only `user/` folder.
    pub fn is_user_path(&self, path: &Path) -> bool {
        normalized(path).starts_with(self.user_dir())
    }

    /// Whether an absolute path is inside `memory/`.
    pub fn is_memory_path(&self, path: &Path) -> bool {
        normalized(path).starts_with(self.memory_dir())
    }

    /// Whether an absolute path is inside `workbench/`.
    pub fn is_workbench_path(&self, path: &Path) -> bool {
        normalized(path).starts_with(self.workbench_dir())
    }

    /// USER_PROFILE.md contents, if the user has written one.
    pub async fn load_user_profile(&self) -> Option<String> {
        tokio::fs::read_to_string(self.user_profile_path())
            .await
            .ok()
    }
}

async fn seed_if_missing(path: &Path, template: &str) -> Result<(), WorkspaceError> {
    if path.exists() {
        return Ok(());
    }
    tokio::fs::write(path, template).await?;
    Ok(())
}

/// Lexically normalize a path: strip `.`, resolve `..` against preceding
/// components. Works for paths that do not exist yet.
pub(crate) fn normalized(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();

        assert!(ws.user_dir().is_dir());
        assert!(ws.archive_dir().is_dir());
        assert!(ws.soul_dir().join("SOUL.md").is_file());
        assert!(ws.soul_dir().join("BOOTSTRAP.md").is_file());
        assert!(ws.memory_index_path().is_file());
    }

    #[tokio::test]
    async fn test_init_does_not_reseed_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();

        // First-run setup finished: the agent deletes BOOTSTRAP.md.
        tokio::fs::remove_file(ws.soul_dir().join("BOOTSTRAP.md"))
            .await
            .unwrap();

        ws.init().await.unwrap();
        assert!(!ws.soul_dir().join("BOOTSTRAP.md").exists());
    }

    #[tokio::test]
    async fn test_init_preserves_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init().await.unwrap();

        tokio::fs::write(ws.soul_dir().join("SOUL.md"), "custom soul")
            .await
            .unwrap();
        ws.init().await.unwrap();

        let soul = tokio::fs::read_to_string(ws.soul_dir().join("SOUL.md"))
            .await
            .unwrap();
        assert_eq!(soul, "custom soul");
    }

    #[test]
    fn test_resolve_confines_to_root() {
        let ws = Workspace::new("/tmp/claw-test");
        assert!(ws.resolve("user/notes.md").is_ok());
        assert!(ws.resolve("memory/../user/x.md").is_ok());
        assert!(matches!(
            ws.resolve("../outside.md"),
            Err(WorkspaceError::AccessDenied { .. })
        ));
        assert!(matches!(
            ws.resolve("user/../../etc/passwd"),
            Err(WorkspaceError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_folder_membership() {
        let ws = Workspace::new("/tmp/claw-test");
        assert!(ws.is_user_path(&ws.user_dir().join("a.txt")));
        assert!(!ws.is_user_path(&ws.memory_dir().join("a.txt")));
        assert!(ws.is_workbench_path(&ws.archive_dir()));
        // `..` does not smuggle a path into user/.
        assert!(!ws.is_user_path(&ws.user_dir().join("../memory/a.txt")));
    }
}
