//! Shared HTTP client construction for upstream checkers.

use std::time::Duration;
use tracing::warn;

/// Build a client with the given timeout and optional user agent.
///
/// On builder failure the default client is returned without the timeout,
/// and the failure is logged.
pub fn http_client(timeout: Duration, user_agent: Option<&str>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    if let Some(agent) = user_agent {
        builder = builder.user_agent(agent.to_string());
    }
    builder.build().unwrap_or_else(|e| {
        warn!(
            error = %e,
            timeout_ms = timeout.as_millis() as u64,
            "Failed to build HTTP client, falling back to defaults without timeout"
        );
        reqwest::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_applies_timeout_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "goalforge-test"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = http_client(Duration::from_millis(50), Some("goalforge-test"));
        let err = client.get(server.uri()).send().await.unwrap_err();
        assert!(err.is_timeout());

        let client = http_client(Duration::from_secs(5), Some("goalforge-test"));
        let response = client.get(server.uri()).send().await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
