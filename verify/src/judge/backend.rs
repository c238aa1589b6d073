//! Chat-completion backend seam for the proof judge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;

/// Error types for LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Backend is not available
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with a non-success status
    #[error("Request failed with HTTP {status}")]
    RequestFailed { status: u16 },

    /// Rate limited by the backend
    #[error("Rate limited")]
    RateLimited,

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LlmError> for VerifyError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unavailable(msg) | LlmError::NetworkError(msg) => VerifyError::Network(msg),
            LlmError::RequestFailed { status } => VerifyError::Upstream {
                service: "llm",
                status,
            },
            LlmError::RateLimited => VerifyError::Upstream {
                service: "llm",
                status: 429,
            },
            LlmError::ParseError(msg) => VerifyError::InvalidResponse(msg),
        }
    }
}

/// Core trait for LLM backends.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Backend identifier (the model name).
    fn id(&self) -> &str;

    /// Generate a completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Request for LLM completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<Message>,
    pub max_tokens: Option<u32>,
    /// Temperature (0.0-2.0)
    pub temperature: Option<f32>,
    /// Ask for a JSON object reply
    pub json_output: bool,
}

impl CompletionRequest {
    /// Create a new request with a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            ..Default::default()
        }
    }

    pub fn with_system(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Response from LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
}
