//! Configuration: `config.json` in the workspace root, with environment
//! variable overrides for the API key.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ConfigError;

/// Environment variables checked (in order) for the API key.
const API_KEY_ENV_VARS: &[&str] = &["OPENAI_API_KEY", "CLAWCORE_API_KEY", "LLM_API_KEY"];

/// LLM connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(serialize_with = "serialize_secret")]
    pub api_key: Option<SecretString>,
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
        }
    }
}

/// Heartbeat scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeartbeatSettings {
    pub enabled: bool,
    pub interval_minutes: u64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 60,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub llm: LlmConfig,
    pub heartbeat: HeartbeatSettings,
    /// Workspace root. Not persisted; always set from the resolved directory.
    #[serde(skip)]
    pub workspace: PathBuf,
}

impl Config {
    /// Load from `<workspace>/config.json`, falling back to defaults when the
    /// file is missing or unparseable. The API key is filled from the
    /// environment when the file does not provide one.
    pub async fn load(workspace: &Path) -> Self {
        let path = config_path(workspace);
        let mut config = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<Config>(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Unparseable config.json, using defaults");
                Config::default()
            }),
            Err(_) => Config::default(),
        };
        config.workspace = workspace.to_path_buf();

        if config.llm.api_key.is_none() {
            config.llm.api_key = api_key_from_env();
        }
        config
    }

    /// Persist to `<workspace>/config.json`.
    pub async fn save(&self) -> Result<(), ConfigError> {
        let path = config_path(&self.workspace);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut body = serde_json::to_string_pretty(self)?;
        body.push('\n');
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.llm.api_key.is_some()
    }
}

/// Resolve the workspace directory: explicit override, or `Desktop/ClawCore`,
/// falling back to the home directory when there is no Desktop.
pub fn resolve_workspace_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    let base = dirs::desktop_dir()
        .filter(|d| d.is_dir())
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("ClawCore")
}

/// Path of the config file inside a workspace.
pub fn config_path(workspace: &Path) -> PathBuf {
    workspace.join("config.json")
}

fn api_key_from_env() -> Option<SecretString> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}

fn serialize_secret<S: Serializer>(
    key: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match key {
        Some(key) => serializer.serialize_some(key.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).await;
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(config.heartbeat.enabled);
        assert_eq!(config.heartbeat.interval_minutes, 60);
        assert_eq!(config.workspace, dir.path());
    }

    #[tokio::test]
    async fn test_defaults_when_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(config_path(dir.path()), "{not json")
            .await
            .unwrap();
        let config = Config::load(dir.path()).await;
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load(dir.path()).await;
        config.llm.model = "gpt-4o-mini".to_string();
        config.llm.api_key = Some(SecretString::from("sk-test".to_string()));
        config.heartbeat.interval_minutes = 15;
        config.save().await.unwrap();

        let reloaded = Config::load(dir.path()).await;
        assert_eq!(reloaded.llm.model, "gpt-4o-mini");
        assert_eq!(reloaded.heartbeat.interval_minutes, 15);
        assert_eq!(
            reloaded.llm.api_key.unwrap().expose_secret(),
            "sk-test"
        );
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let raw = r#"{"heartbeat": {"intervalMinutes": 5}}"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.heartbeat.interval_minutes, 5);
        // Unspecified sections keep their defaults.
        assert!(config.heartbeat.enabled);
        assert_eq!(config.llm.model, "gpt-4o");
    }
}
