//! LLM proof judge.
//!
//! Bundles the context's evidence for the habit's judge persona, submits it
//! once at low temperature and parses the structured verdict.
//!
//! - [`LlmBackend`]: chat-completions seam
//! - [`OpenAiBackend`]: OpenAI-compatible HTTP backend (OpenRouter by default)
//! - [`MockBackend`]: canned replies for tests

pub mod backend;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod verdict;

pub use backend::{CompletionRequest, CompletionResponse, LlmBackend, LlmError, Message, MessageRole};
pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use verdict::{parse_verdict, Verdict};

use chrono::{DateTime, Utc};
use goalforge_ledger::HabitType;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::context::VerificationContext;
use crate::error::{Result, VerifyError};

#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Without a key the judge is unconfigured
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Sent as `HTTP-Referer`
    pub app_url: String,
    /// Sent as `X-Title`
    pub app_title: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: openai::OPENROUTER_BASE_URL.to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            app_url: "https://goalforge.app".to_string(),
            app_title: "GoalForge Task Verification".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A verdict with request metadata, as returned to API clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeReport {
    pub verified: bool,
    pub confidence: u8,
    pub reason: String,
    pub model: String,
    pub habit_type: HabitType,
    pub habit_name: String,
    pub timestamp: DateTime<Utc>,
}

pub struct LlmProofJudge {
    backend: Option<Arc<dyn LlmBackend>>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmProofJudge {
    /// Judge over the configured OpenAI-compatible endpoint.
    pub fn from_config(config: &JudgeConfig) -> Self {
        let backend = config.api_key.as_ref().map(|key| {
            let backend = OpenAiBackend::new(
                config.base_url.clone(),
                config.model.clone(),
                Some(key.clone()),
                config.request_timeout,
            )
            .with_header("http-referer", &config.app_url)
            .with_header("x-title", &config.app_title);
            Arc::new(backend) as Arc<dyn LlmBackend>
        });

        Self {
            backend,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// Judge over an arbitrary backend.
    pub fn with_backend(backend: Arc<dyn LlmBackend>) -> Self {
        let defaults = JudgeConfig::default();
        Self {
            backend: Some(backend),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    /// A judge that always reports missing configuration.
    pub fn unconfigured() -> Self {
        Self {
            backend: None,
            temperature: 0.0,
            max_tokens: 0,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn judge(&self, ctx: &VerificationContext) -> Result<JudgeReport> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| VerifyError::Configuration("OpenRouter API key not configured".into()))?;
        let user_message = prompt::user_message(ctx).ok_or(VerifyError::NoEvidence)?;
        let profile = ctx.habit.profile();

        let request = CompletionRequest::user(user_message)
            .with_system(prompt::system_prompt(profile))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_json_output();

        let response = backend.complete(request).await?;
        let verdict = parse_verdict(&response.content)?;
        debug!(
            habit = %ctx.habit,
            verified = verdict.verified,
            confidence = verdict.confidence,
            "Judge verdict"
        );

        Ok(JudgeReport {
            verified: verdict.verified,
            confidence: verdict.confidence,
            reason: verdict.reason,
            model: response.model,
            habit_type: ctx.habit,
            habit_name: profile.name.to_string(),
            timestamp: Utc::now(),
        })
    }
}
