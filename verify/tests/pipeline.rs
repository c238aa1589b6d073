//! Orchestrated verification with real checkers and the HTTP judge backend.

mod common;

use common::*;
use goalforge_ledger::HabitType;
use goalforge_verify::{
    FitnessChecker, GitHubChecker, LlmProofJudge, VerificationContext, VerificationMethod,
    VerificationOrchestrator, Verifier, VerifyError,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn orchestrator(server: &MockServer) -> VerificationOrchestrator {
    let stages: Vec<Arc<dyn Verifier>> = vec![
        Arc::new(GitHubChecker::new(github_config(server))),
        Arc::new(FitnessChecker::new(fitness_config(server))),
    ];
    let judge = Arc::new(LlmProofJudge::from_config(&judge_config(server)));
    VerificationOrchestrator::new(stages, judge)
}

#[tokio::test]
async fn test_verified_github_never_calls_judge() {
    let server = MockServer::start().await;
    mount_events(
        &server,
        "octocat",
        json!([push_event("octocat/hello", "2026-10-14T09:00:00Z", 1)]),
    )
    .await;
    mount_graph(&server, "octocat", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = VerificationContext::new(HabitType::Coding, target_day())
        .with_handle(Some("octocat".into()))
        .with_proof_text(Some("pushed a fix".into()));
    let outcome = orchestrator(&server).verify(ctx).await.unwrap();

    assert!(outcome.final_verified);
    assert_eq!(outcome.verification_method, VerificationMethod::GithubAuto);
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(outcome.steps[0].service, "github");
    assert!(!outcome.has_step("llm"));
    assert_eq!(
        outcome.summary,
        "Verified via GitHub: Found 1 commit(s) on 2026-10-14"
    );
}

#[tokio::test]
async fn test_dsa_falls_through_to_judge_with_github_data() {
    let server = MockServer::start().await;
    mount_events(&server, "solver", json!([])).await;
    mount_graph(&server, "solver", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-title", "GoalForge Task Verification"))
        .and(body_partial_json(json!({
            "model": "openai/gpt-4o-mini",
            "max_tokens": 500,
            "response_format": { "type": "json_object" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content":
                "{\"verified\": true, \"confidence\": 82, \"reason\": \"Accepted LeetCode submission\"}" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = VerificationContext::new(HabitType::Dsa, target_day())
        .with_handle(Some("solver".into()))
        .with_proof_text(Some("Solved Two Sum".into()));
    let outcome = orchestrator(&server).verify(ctx).await.unwrap();

    assert!(outcome.final_verified);
    assert_eq!(outcome.verification_method, VerificationMethod::Llm);
    assert_eq!(
        outcome.summary,
        "Verified by AI (82% confidence): Accepted LeetCode submission"
    );
    let services: Vec<&str> = outcome.steps.iter().map(|s| s.service.as_str()).collect();
    assert_eq!(services, vec!["github", "llm"]);
    assert!(outcome.github.is_some());

    let requests = server.received_requests().await.unwrap();
    let judge_request = requests
        .iter()
        .find(|r| r.url.path() == "/api/v1/chat/completions")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&judge_request.body).unwrap();
    let user_message = body["messages"][1]["content"].as_str().unwrap();
    assert!(user_message.contains("GitHub Activity Data:"));
    assert!(user_message.contains("User's Proof Description:\nSolved Two Sum"));
}

#[tokio::test]
async fn test_expired_fitness_token_surfaces_reauth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_judge_reply(
        &server,
        r#"{"verified": false, "confidence": 30, "reason": "Photo does not show a gym"}"#,
    )
    .await;

    let ctx = VerificationContext::new(HabitType::Gym, target_day())
        .with_fitness_token(Some("expired".into()))
        .with_proof_image(Some("https://img.example/gym.jpg".into()));
    let outcome = orchestrator(&server).verify(ctx).await.unwrap();

    assert!(!outcome.final_verified);
    assert!(outcome.needs_reauth);
    assert!(outcome.steps[0].needs_reauth);
    assert_eq!(outcome.steps[0].service, "google_fit");
    assert_eq!(outcome.summary, "Photo does not show a gym");
}

#[tokio::test]
async fn test_unparseable_judge_reply_is_an_error() {
    let server = MockServer::start().await;
    mount_judge_reply(&server, "The user probably went running.").await;

    let ctx = VerificationContext::new(HabitType::Running, target_day())
        .with_proof_text(Some("ran 5k".into()));
    let result = orchestrator(&server).verify(ctx).await;

    assert!(matches!(result, Err(VerifyError::UnparseableVerdict(_))));
}

#[tokio::test]
async fn test_judge_upstream_error_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let ctx = VerificationContext::new(HabitType::Yoga, target_day())
        .with_proof_text(Some("sun salutations".into()));
    let outcome = orchestrator(&server).verify(ctx).await.unwrap();

    assert!(!outcome.final_verified);
    assert_eq!(outcome.verification_method, VerificationMethod::None);
    assert_eq!(outcome.steps[0].service, "llm");
    let error = outcome.steps[0].error.as_deref().unwrap();
    assert!(!error.contains("bad gateway"));
}

#[tokio::test]
async fn test_nothing_to_check() {
    let server = MockServer::start().await;
    let ctx = VerificationContext::new(HabitType::Gym, target_day());
    let outcome = orchestrator(&server).verify(ctx).await.unwrap();

    assert!(!outcome.final_verified);
    assert_eq!(outcome.verification_method, VerificationMethod::None);
    assert!(outcome.steps.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}
