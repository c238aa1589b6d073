//! Verification endpoints
//!
//! - `POST /verify/github` - contribution check for one day
//! - `POST /verify/llm` - judge caller-supplied proof and evidence
//! - `POST /verify/task` - full pipeline: automatic checks, then the judge

use bytes::Bytes;
use goalforge_verify::{Evidence, EvidenceKind, VerificationContext};
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::fitness::ACCESS_TOKEN_COOKIE;
use super::{
    cookie, error_response, invalid_habit_response, json_response, non_blank, parse_date,
    parse_habit, parse_json_body, verify_error_response,
};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GitHubVerifyRequest {
    username: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmVerifyRequest {
    habit_type: Option<Value>,
    proof_text: Option<String>,
    proof_image_url: Option<String>,
    github_data: Option<Value>,
    fitness_data: Option<Value>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskVerifyRequest {
    habit_type: Option<Value>,
    username: Option<String>,
    proof_text: Option<String>,
    proof_image_url: Option<String>,
    wallet_address: Option<String>,
    fitness_access_token: Option<String>,
    date: Option<String>,
}

/// POST /verify/github
pub async fn verify_github(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: GitHubVerifyRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let Some(username) = non_blank(body.username) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "GitHub username is required",
            "Provide the GitHub username to check",
        );
    };
    let date = match parse_date(body.date.as_deref()) {
        Ok(d) => d,
        Err(response) => return response,
    };

    match state.github.check(&username, date).await {
        Ok(report) => {
            info!(username = %username, %date, verified = report.verified, "GitHub verification");
            json_response(StatusCode::OK, &report)
        }
        Err(err) => verify_error_response(&err),
    }
}

/// POST /verify/llm
pub async fn verify_llm(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    if !state.judge.is_configured() {
        return json_response(
            StatusCode::NOT_IMPLEMENTED,
            &json!({
                "error": "OpenRouter API key not configured",
                "message": "Set OPENROUTER_API_KEY in .env",
            }),
        );
    }

    let body: LlmVerifyRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let Some(habit) = parse_habit(body.habit_type.as_ref()) else {
        return invalid_habit_response();
    };
    let date = match parse_date(body.date.as_deref()) {
        Ok(d) => d,
        Err(response) => return response,
    };

    let mut ctx = VerificationContext::new(habit, date)
        .with_proof_text(body.proof_text)
        .with_proof_image(body.proof_image_url);
    if let Some(data) = body.github_data.filter(|v| !v.is_null()) {
        ctx = ctx.with_evidence(Evidence::new(EvidenceKind::GitHub, data));
    }
    if let Some(data) = body.fitness_data.filter(|v| !v.is_null()) {
        ctx = ctx.with_evidence(Evidence::new(EvidenceKind::Fitness, data));
    }
    if !ctx.has_evidence() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "No proof provided for verification",
            "Submit a proof description, an image or tracker data",
        );
    }

    match state.judge.judge(&ctx).await {
        Ok(report) => {
            info!(
                habit = %habit,
                verified = report.verified,
                confidence = report.confidence,
                "LLM verification"
            );
            json_response(StatusCode::OK, &report)
        }
        Err(err) => verify_error_response(&err),
    }
}

/// POST /verify/task
///
/// The fitness token comes from the body or the `google_fit_access_token`
/// cookie set by the OAuth callback.
pub async fn verify_task(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: TaskVerifyRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let Some(habit) = parse_habit(body.habit_type.as_ref()) else {
        return invalid_habit_response();
    };
    let date = match parse_date(body.date.as_deref()) {
        Ok(d) => d,
        Err(response) => return response,
    };
    let fitness_token =
        non_blank(body.fitness_access_token).or_else(|| cookie(req, ACCESS_TOKEN_COOKIE));

    let ctx = VerificationContext::new(habit, date)
        .with_handle(body.username)
        .with_proof_text(body.proof_text)
        .with_proof_image(body.proof_image_url)
        .with_wallet(body.wallet_address)
        .with_fitness_token(fitness_token);

    match state.orchestrator.verify(ctx).await {
        Ok(outcome) => {
            info!(
                habit = %habit,
                verified = outcome.final_verified,
                method = ?outcome.verification_method,
                steps = outcome.steps.len(),
                "Task verification"
            );
            json_response(StatusCode::OK, &outcome)
        }
        Err(err) => verify_error_response(&err),
    }
}
