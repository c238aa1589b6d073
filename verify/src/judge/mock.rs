//! Mock LLM backend for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use super::backend::*;

/// Mock backend with a canned reply.
///
/// Records every request so tests can inspect the prompt the judge built.
pub struct MockBackend {
    model_id: String,
    available: AtomicBool,
    response_content: String,
    call_count: AtomicU32,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockBackend {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            available: AtomicBool::new(true),
            response_content: r#"{"verified": true, "confidence": 90, "reason": "Mock verdict"}"#
                .to_string(),
            call_count: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Set the response content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        self.response_content = content.into();
        self
    }

    /// Set availability. An unavailable mock fails like an unreachable host.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Number of times complete was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock-model")
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlmError::Unavailable("Mock backend disabled".to_string()));
        }

        Ok(CompletionResponse {
            content: self.response_content.clone(),
            model: self.model_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_calls_and_records_requests() {
        let backend = MockBackend::default().with_response("{}");
        let response = backend
            .complete(CompletionRequest::user("hello").with_temperature(0.1))
            .await
            .unwrap();

        assert_eq!(response.content, "{}");
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.last_request().unwrap().messages[0].content, "hello");
    }

    #[tokio::test]
    async fn test_unavailable() {
        let backend = MockBackend::default().with_available(false);
        assert!(matches!(
            backend.complete(CompletionRequest::user("x")).await,
            Err(LlmError::Unavailable(_))
        ));
        assert_eq!(backend.call_count(), 1);
    }
}
