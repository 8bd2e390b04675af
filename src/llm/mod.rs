//! LLM integration: provider-agnostic types and the OpenAI-compatible client.

mod openai;
mod provider;

pub use openai::OpenAiProvider;
pub use provider::{
    ChatMessage, ChunkSink, FinishReason, LlmProvider, LlmResponse, Role, ToolCall, ToolDefinition,
};

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Create an LLM provider from configuration.
pub fn create_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        "Using OpenAI-compatible chat completions API"
    );
    Ok(Arc::new(OpenAiProvider::new(config.clone())?))
}
