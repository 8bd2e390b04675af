//! Provider-agnostic message and tool types, plus the `LlmProvider` trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
///
/// `arguments` is kept as the raw JSON text the model produced. Parsing
/// happens in the agent loop so that a malformed payload becomes that call's
/// error result instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// One message in the conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Present on assistant messages that request tool calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Present on tool-result messages: the id of the originating call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Present on tool-result messages: the tool's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::bare(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::bare(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::bare(Role::Assistant, content)
    }

    /// Assistant message carrying the raw tool-call requests of a round.
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::bare(Role::Assistant, content)
        }
    }

    /// Tool-result message tagged with the originating call.
    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            name: Some(tool_name.into()),
            ..Self::bare(Role::Tool, content)
        }
    }

    fn bare(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

/// JSON-Schema description of a callable tool, as sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Aggregate result of one model call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Text content; empty when the model only requested tools.
    pub content: String,
    /// Tool calls in the order the model requested them.
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
}

impl LlmResponse {
    /// A pure text response (mainly for tests and fakes).
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolUse,
    ContentFilter,
    Unknown,
}

/// Callback receiving incremental text chunks from a streaming completion.
pub type ChunkSink<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// A chat-completion backend.
///
/// Implementations must be safe to call repeatedly with a monotonically
/// growing history.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion over the full history with the fixed tool catalog.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError>;

    /// Streaming variant: deliver text chunks as they arrive, then resolve
    /// to the same aggregate shape as [`complete`](Self::complete).
    ///
    /// The default implementation does not stream.
    async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        on_chunk: ChunkSink<'_>,
    ) -> Result<LlmResponse, LlmError> {
        let response = self.complete(messages, tools).await?;
        if !response.content.is_empty() {
            on_chunk(&response.content);
        }
        Ok(response)
    }

    /// The model this provider talks to.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_none());

        let result = ChatMessage::tool_result("call_1", "read_file", "contents");
        assert_eq!(result.role, Role::Tool);
        assert_eq!(result.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(result.name.as_deref(), Some("read_file"));
    }

    #[test]
    fn test_assistant_with_tool_calls_keeps_order() {
        let calls = vec![
            ToolCall {
                id: "a".into(),
                name: "one".into(),
                arguments: "{}".into(),
            },
            ToolCall {
                id: "b".into(),
                name: "two".into(),
                arguments: "{}".into(),
            },
        ];
        let msg = ChatMessage::assistant_with_tool_calls("", calls.clone());
        assert_eq!(msg.tool_calls.unwrap(), calls);
    }
}
