//! Liveness probe
//!
//! Returns 200 whenever the process is serving. Reports which optional
//! verification backends are configured so operators can spot a missing key.

use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json_response;
use crate::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
    pub mode: &'static str,
    pub verification: VerificationBackends,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationBackends {
    pub llm_judge: bool,
    pub google_fit_oauth: bool,
    pub github_token: bool,
}

pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let response = HealthResponse {
        healthy: true,
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        verification: VerificationBackends {
            llm_judge: state.judge.is_configured(),
            google_fit_oauth: state.oauth.is_configured(),
            github_token: state.args.github_token.is_some(),
        },
    };

    json_response(StatusCode::OK, &response)
}
