//! OpenAI-compatible chat-completions backend.
//!
//! Defaults target OpenRouter; any endpoint speaking the same protocol works.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use super::backend::*;
use crate::client::http_client;

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    extra_headers: header::HeaderMap,
}

impl OpenAiBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let client = http_client(timeout, None);

        Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            extra_headers: header::HeaderMap::new(),
        }
    }

    /// Backend for the OpenRouter API.
    pub fn openrouter(model: &str, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::new(OPENROUTER_BASE_URL, model, Some(api_key.into()), timeout)
    }

    /// Send an extra header with every request. Invalid values are skipped.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        match header::HeaderValue::from_str(value) {
            Ok(v) => {
                self.extra_headers.insert(name, v);
            }
            Err(_) => warn!(header = name, "Skipping invalid header value"),
        }
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatRequest>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatRequest {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    fn id(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut messages: Vec<ChatMessage> = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        for msg in request.messages {
            messages.push(ChatMessage {
                role: msg.role.as_str(),
                content: msg.content,
            });
        }

        let chat_request = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_output.then_some(ResponseFormatRequest {
                format_type: "json_object",
            }),
        };

        let mut http_request = self
            .client
            .post(self.chat_completions_url())
            .headers(self.extra_headers.clone());
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(LlmError::RateLimited);
            }
            // Body is logged, never returned to callers.
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Chat completion failed");
            return Err(LlmError::RequestFailed {
                status: status.as_u16(),
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::ParseError("No response from verification model".into()))?;

        Ok(CompletionResponse {
            content,
            model: self.model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openrouter_creation() {
        let backend = OpenAiBackend::openrouter("openai/gpt-4o-mini", "key", Duration::from_secs(5));
        assert_eq!(backend.id(), "openai/gpt-4o-mini");
        assert_eq!(
            backend.chat_completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }

    #[test]
    fn test_invalid_header_is_skipped() {
        let backend = OpenAiBackend::new("http://localhost:1/v1/", "m", None, Duration::from_secs(1))
            .with_header("x-title", "GoalForge Task Verification")
            .with_header("http-referer", "bad\nvalue");
        assert_eq!(backend.extra_headers.len(), 1);
        assert_eq!(backend.chat_completions_url(), "http://localhost:1/v1/chat/completions");
    }
}
