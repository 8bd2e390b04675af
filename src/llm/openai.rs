//! OpenAI-compatible chat-completions provider.
//!
//! Works against any endpoint that speaks the standard chat completions API
//! with API key authentication (OpenAI itself, or a compatible gateway).

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, ChunkSink, FinishReason, LlmProvider, LlmResponse, Role, ToolCall, ToolDefinition,
};

/// OpenAI-compatible chat completions provider.
pub struct OpenAiProvider {
    client: Client,
    config: LlmConfig,
}

impl OpenAiProvider {
    /// Create a provider. Fails when no API key is configured.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            return Err(LlmError::AuthFailed {
                provider: "openai".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn api_key(&self) -> String {
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_string())
            .unwrap_or_default()
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        stream: bool,
    ) -> ChatCompletionRequest {
        let wire_tools: Vec<ChatCompletionTool> = tools
            .iter()
            .map(|t| ChatCompletionTool {
                tool_type: "function".to_string(),
                function: ChatCompletionFunction {
                    name: t.name.clone(),
                    description: Some(t.description.clone()),
                    parameters: Some(t.parameters.clone()),
                },
            })
            .collect();

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(ChatCompletionMessage::from).collect(),
            tools: if wire_tools.is_empty() {
                None
            } else {
                Some(wire_tools)
            },
            tool_choice: if tools.is_empty() {
                None
            } else {
                Some("auto".to_string())
            },
            stream: if stream { Some(true) } else { None },
        }
    }

    fn map_error_status(&self, status: reqwest::StatusCode, body: String) -> LlmError {
        if status.as_u16() == 401 {
            return LlmError::AuthFailed {
                provider: "openai".to_string(),
            };
        }
        if status.as_u16() == 429 {
            return LlmError::RateLimited {
                provider: "openai".to_string(),
                retry_after: None,
            };
        }
        LlmError::RequestFailed {
            provider: "openai".to_string(),
            reason: format!("HTTP {}: {}", status, body),
        }
    }

    async fn send(&self, body: &ChatCompletionRequest) -> Result<reqwest::Response, LlmError> {
        let url = self.api_url("chat/completions");
        tracing::debug!(%url, model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.map_error_status(status, text));
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        let request = self.build_request(messages, tools, false);
        let response = self.send(&request).await?;

        let text = response.text().await.unwrap_or_default();
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: format!("JSON parse error: {}. Raw: {}", e, text),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "No choices in response".to_string(),
            })?;

        let message = choice.message.unwrap_or_default();
        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(LlmResponse {
            content: message.content.unwrap_or_default(),
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref(), &tool_calls),
            tool_calls,
        })
    }

    async fn complete_streaming(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        on_chunk: ChunkSink<'_>,
    ) -> Result<LlmResponse, LlmError> {
        let request = self.build_request(messages, tools, true);
        let response = self.send(&request).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut content = String::new();
        let mut partial_calls: BTreeMap<u32, PartialToolCall> = BTreeMap::new();
        let mut finish_reason: Option<String> = None;

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Stream error: {}", e),
            })?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            // SSE events are newline-delimited `data: <json>` lines.
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data.is_empty() || data == "[DONE]" {
                    continue;
                }

                let event: ChatCompletionChunk = match serde_json::from_str(data) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping unparseable stream event");
                        continue;
                    }
                };

                let Some(choice) = event.choices.into_iter().next() else {
                    continue;
                };

                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        on_chunk(&text);
                        content.push_str(&text);
                    }
                }

                for delta in choice.delta.tool_calls.unwrap_or_default() {
                    let entry = partial_calls.entry(delta.index).or_default();
                    if let Some(id) = delta.id {
                        entry.id = id;
                    }
                    if let Some(function) = delta.function {
                        if let Some(name) = function.name {
                            entry.name = name;
                        }
                        if let Some(arguments) = function.arguments {
                            entry.arguments.push_str(&arguments);
                        }
                    }
                }

                if choice.finish_reason.is_some() {
                    finish_reason = choice.finish_reason;
                }
            }
        }

        let tool_calls: Vec<ToolCall> = partial_calls
            .into_values()
            .map(|p| ToolCall {
                id: p.id,
                name: p.name,
                arguments: p.arguments,
            })
            .collect();

        Ok(LlmResponse {
            finish_reason: parse_finish_reason(finish_reason.as_deref(), &tool_calls),
            content,
            tool_calls,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_finish_reason(raw: Option<&str>, tool_calls: &[ToolCall]) -> FinishReason {
    let raw = raw.unwrap_or("");
    if raw.contains("tool_calls") || raw.contains("function_call") || !tool_calls.is_empty() {
        FinishReason::ToolUse
    } else if raw.contains("stop") {
        FinishReason::Stop
    } else if raw.contains("length") {
        FinishReason::Length
    } else if raw.contains("content_filter") {
        FinishReason::ContentFilter
    } else {
        FinishReason::Unknown
    }
}

/// Tool call accumulated across stream deltas.
#[derive(Debug, Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

// OpenAI-compatible Chat Completions API types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatCompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatCompletionTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatCompletionToolCall>>,
}

impl From<&ChatMessage> for ChatCompletionMessage {
    fn from(msg: &ChatMessage) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls = msg.tool_calls.as_ref().map(|calls| {
            calls
                .iter()
                .map(|tc| ChatCompletionToolCall {
                    id: tc.id.clone(),
                    call_type: "function".to_string(),
                    function: ChatCompletionToolCallFunction {
                        name: tc.name.clone(),
                        arguments: tc.arguments.clone(),
                    },
                })
                .collect()
        });
        Self {
            role: role.to_string(),
            content: Some(msg.content.clone()),
            tool_call_id: msg.tool_call_id.clone(),
            name: msg.name.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatCompletionFunction,
}

#[derive(Debug, Serialize)]
struct ChatCompletionFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: Option<ChatCompletionResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatCompletionResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatCompletionToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionToolCall {
    id: String,
    #[serde(rename = "type")]
    #[allow(dead_code)]
    call_type: String,
    function: ChatCompletionToolCallFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatCompletionToolCallFunction {
    name: String,
    arguments: String,
}

// Streaming (SSE) event types

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChatCompletionChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunkChoice {
    delta: ChatCompletionDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionDelta {
    content: Option<String>,
    tool_calls: Option<Vec<ChatCompletionDeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionDeltaToolCall {
    index: u32,
    id: Option<String>,
    function: Option<ChatCompletionDeltaFunction>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionDeltaFunction {
    name: Option<String>,
    arguments: Option<String>,
}
