//! Shared fixtures for the verification integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use goalforge_verify::{FitnessConfig, GitHubConfig, JudgeConfig};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn target_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

pub fn github_config(server: &MockServer) -> GitHubConfig {
    GitHubConfig {
        api_url: server.uri(),
        contributions_url: server.uri(),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub fn fitness_config(server: &MockServer) -> FitnessConfig {
    FitnessConfig {
        api_url: server.uri(),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn judge_config(server: &MockServer) -> JudgeConfig {
    JudgeConfig {
        api_key: Some("test-key".to_string()),
        base_url: format!("{}/api/v1", server.uri()),
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub fn push_event(repo: &str, at: &str, commits: usize) -> Value {
    json!({
        "type": "PushEvent",
        "created_at": at,
        "repo": { "name": repo },
        "payload": { "commits": vec![json!({"sha": "abc"}); commits] }
    })
}

/// Mount the events feed for `user`.
pub async fn mount_events(server: &MockServer, user: &str, events: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/events", user)))
        .respond_with(ResponseTemplate::new(200).set_body_json(events))
        .mount(server)
        .await;
}

/// Mount the contribution graph for `user`.
pub async fn mount_graph(server: &MockServer, user: &str, days: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v4/{}", user)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "contributions": days })))
        .mount(server)
        .await;
}

/// Mount a chat-completions reply whose message content is `content`.
pub async fn mount_judge_reply(server: &MockServer, content: &str) {
    let body = json!({
        "id": "chatcmpl-test",
        "model": "openai/gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    });

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}
