//! GitHub, fitness and OAuth clients against mocked upstreams.

mod common;

use common::*;
use goalforge_ledger::HabitType;
use goalforge_verify::{
    FitnessChecker, GitHubChecker, GoogleFitOAuth, OAuthConfig, VerifyError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// GitHub
// =============================================================================

#[tokio::test]
async fn test_push_event_today_verifies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events"))
        .and(query_param("per_page", "100"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .and(header("user-agent", "GoalForge-App"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            push_event("octocat/hello", "2026-10-14T08:30:00Z", 2),
            push_event("octocat/old", "2026-10-12T08:30:00Z", 9),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let checker = GitHubChecker::new(github_config(&server));
    let report = checker.check("octocat", target_day()).await.unwrap();

    assert!(report.verified);
    assert_eq!(report.contributions.commits, 2);
    assert_eq!(report.contributions.total, 2);
    assert_eq!(report.summary, "Found 2 commit(s) on 2026-10-14");
    assert_eq!(report.recent_repos, vec!["octocat/hello"]);
}

#[tokio::test]
async fn test_graph_count_wins_when_larger() {
    let server = MockServer::start().await;
    mount_events(&server, "quiet", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/v4/quiet"))
        .and(query_param("y", "2026"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contributions": [
                { "date": "2026-10-13", "count": 1, "level": 1 },
                { "date": "2026-10-14", "count": 3, "level": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let checker = GitHubChecker::new(github_config(&server));
    let report = checker.check("quiet", target_day()).await.unwrap();

    assert!(report.verified);
    assert_eq!(report.contributions.total, 3);
    assert_eq!(report.contributions.commits, 0);
    assert_eq!(report.summary, "Found 3 contribution(s) on 2026-10-14");
}

#[tokio::test]
async fn test_graph_failure_is_ignored() {
    let server = MockServer::start().await;
    mount_events(&server, "idle", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/v4/idle"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let checker = GitHubChecker::new(github_config(&server));
    let report = checker.check("idle", target_day()).await.unwrap();

    assert!(!report.verified);
    assert_eq!(report.summary, "No contributions found on 2026-10-14");
}

#[tokio::test]
async fn test_unknown_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/events"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let checker = GitHubChecker::new(github_config(&server));
    assert_eq!(
        checker.check("ghost", target_day()).await.unwrap_err(),
        VerifyError::UnknownUser("ghost".into())
    );
}

#[tokio::test]
async fn test_events_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let checker = GitHubChecker::new(github_config(&server));
    assert_eq!(
        checker.check("octocat", target_day()).await.unwrap_err(),
        VerifyError::Upstream {
            service: "github",
            status: 500
        }
    );
}

// =============================================================================
// Fitness
// =============================================================================

async fn mount_sessions(server: &MockServer, sessions: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/users/me/sessions"))
        .and(query_param("startTime", "2026-10-14T00:00:00.000Z"))
        .and(query_param("endTime", "2026-10-14T23:59:59.999Z"))
        .and(header("authorization", "Bearer fit-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "session": sessions })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_gym_sessions_verify() {
    let server = MockServer::start().await;
    mount_sessions(
        &server,
        json!([
            { "activityType": 80, "startTimeMillis": "1760428800000", "endTimeMillis": "1760430000000" },
            { "activityType": 72, "startTimeMillis": "1760430000000", "endTimeMillis": "1760440000000" }
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/users/me/dataset:aggregate"))
        .and(body_partial_json(json!({
            "aggregateBy": [
                { "dataTypeName": "com.google.step_count.delta" },
                { "dataTypeName": "com.google.calories.expended" },
                { "dataTypeName": "com.google.distance.delta" },
                { "dataTypeName": "com.google.active_minutes" }
            ],
            "bucketByTime": { "durationMillis": 86_399_999 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bucket": [{ "dataset": [
                { "dataSourceId": "derived:com.google.step_count.delta:merged",
                  "point": [{ "value": [{ "intVal": 1200 }] }] }
            ]}]
        })))
        .mount(&server)
        .await;

    let checker = FitnessChecker::new(fitness_config(&server));
    let report = checker
        .check("fit-token", HabitType::Gym, target_day())
        .await
        .unwrap();

    assert!(report.verified);
    assert_eq!(report.activity.sessions, 1);
    assert_eq!(report.activity.total_minutes, 20);
    assert_eq!(report.activity.required_minutes, 20);
    assert_eq!(report.fitness.steps, 1200);
    assert_eq!(
        report.summary,
        "Gym activity verified: 20 minutes of activity detected, 1200 steps"
    );
}

#[tokio::test]
async fn test_aggregate_failure_uses_zeros() {
    let server = MockServer::start().await;
    mount_sessions(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/users/me/dataset:aggregate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let checker = FitnessChecker::new(fitness_config(&server));
    let report = checker
        .check("fit-token", HabitType::Running, target_day())
        .await
        .unwrap();

    assert!(!report.verified);
    assert_eq!(report.fitness.steps, 0);
    assert_eq!(report.summary, "Insufficient Running activity: 0/10 minutes required");
}

#[tokio::test]
async fn test_expired_token_needs_reauth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let checker = FitnessChecker::new(fitness_config(&server));
    assert_eq!(
        checker
            .check("stale", HabitType::Yoga, target_day())
            .await
            .unwrap_err(),
        VerifyError::NeedsReauth
    );
}

#[tokio::test]
async fn test_code_habit_is_unsupported() {
    let server = MockServer::start().await;
    let checker = FitnessChecker::new(fitness_config(&server));
    assert_eq!(
        checker
            .check("fit-token", HabitType::Coding, target_day())
            .await
            .unwrap_err(),
        VerifyError::UnsupportedHabit(HabitType::Coding)
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

// =============================================================================
// OAuth
// =============================================================================

#[tokio::test]
async fn test_code_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.token",
            "refresh_token": "1//refresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let oauth = GoogleFitOAuth::new(OAuthConfig {
        client_id: Some("client".into()),
        client_secret: Some("secret".into()),
        token_url: format!("{}/token", server.uri()),
        ..Default::default()
    });
    let grant = oauth.exchange_code("auth-code").await.unwrap();

    assert_eq!(grant.access_token, "ya29.token");
    assert_eq!(grant.refresh_token.as_deref(), Some("1//refresh"));
    assert_eq!(grant.lifetime_secs(), 3599);
}

#[tokio::test]
async fn test_rejected_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&server)
        .await;

    let oauth = GoogleFitOAuth::new(OAuthConfig {
        client_id: Some("client".into()),
        client_secret: Some("secret".into()),
        token_url: format!("{}/token", server.uri()),
        ..Default::default()
    });
    assert!(matches!(
        oauth.exchange_code("bad").await,
        Err(VerifyError::Upstream { status: 400, .. })
    ));
}
