//! Error types shared across the crate.

/// Errors from the LLM provider layer.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Authentication was rejected (missing or invalid API key).
    #[error("Authentication failed for provider '{provider}'")]
    AuthFailed { provider: String },

    /// The provider asked us to slow down.
    #[error("Rate limited by provider '{provider}'")]
    RateLimited {
        provider: String,
        retry_after: Option<std::time::Duration>,
    },

    /// Transport or HTTP-level failure.
    #[error("Request to provider '{provider}' failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    /// The provider answered with something we could not interpret.
    #[error("Invalid response from provider '{provider}': {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Errors from workspace filesystem operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// Path points outside the directory the operation is confined to.
    #[error("Access denied: {path}")]
    AccessDenied { path: String },

    /// Expected file or directory is missing.
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from configuration loading and saving.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.json.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config could not be serialized for saving.
    #[error("Config serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
