//! Google Fit endpoints
//!
//! - `POST /verify/fitness` - activity check with a client or cookie token
//! - `GET /verify/fitness?action=auth|status` - consent redirect / connection status
//! - `GET /verify/fitness/callback` - authorization-code exchange, sets token cookies

use bytes::Bytes;
use goalforge_verify::oauth::REFRESH_TOKEN_LIFETIME_SECS;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    cookie, error_response, invalid_habit_response, json_response, non_blank, parse_date,
    parse_habit, parse_json_body, parse_query, redirect_response, verify_error_response,
};
use crate::server::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "google_fit_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "google_fit_refresh_token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FitnessVerifyRequest {
    access_token: Option<String>,
    habit_type: Option<Value>,
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActionQuery {
    action: Option<String>,
    state: Option<String>,
    wallet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct FitnessStatus {
    configured: bool,
    connected: bool,
    message: &'static str,
}

/// POST /verify/fitness
pub async fn verify_fitness(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: FitnessVerifyRequest = match parse_json_body(req) {
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
    let Some(token) = non_blank(body.access_token).or_else(|| cookie(req, ACCESS_TOKEN_COOKIE))
    else {
        return json_response(
            StatusCode::BAD_REQUEST,
            &json!({
                "error": "No fitness data source available",
                "message": "Please connect Google Fit or submit proof for LLM verification",
                "useManualProof": true,
            }),
        );
    };

    match state.fitness.check(&token, habit, date).await {
        Ok(report) => {
            info!(habit = %habit, %date, verified = report.verified, "Fitness verification");
            json_response(StatusCode::OK, &report)
        }
        Err(err) => verify_error_response(&err),
    }
}

/// GET /verify/fitness?action=auth|status
///
/// A missing action reads as `status`.
pub fn fitness_action(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let query: ActionQuery = match parse_query(req) {
        Ok(q) => q,
        Err(response) => return response,
    };

    match query.action.as_deref().unwrap_or("status") {
        "auth" => {
            if !state.oauth.is_configured() {
                return error_response(
                    StatusCode::NOT_IMPLEMENTED,
                    "Google Fit not configured",
                    "Set GOOGLE_FIT_CLIENT_ID and GOOGLE_FIT_CLIENT_SECRET in .env",
                );
            }
            let oauth_state = non_blank(query.state)
                .or_else(|| non_blank(query.wallet))
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            match state.oauth.authorization_url(&oauth_state) {
                Ok(url) => redirect_response(&url, &[]),
                Err(err) => verify_error_response(&err),
            }
        }
        "status" => {
            let configured = state.oauth.is_configured();
            let connected = cookie(req, ACCESS_TOKEN_COOKIE).is_some()
                || cookie(req, REFRESH_TOKEN_COOKIE).is_some();
            let message = if !configured {
                "Google Fit is not configured. Use LLM proof verification instead."
            } else if connected {
                "Google Fit is connected"
            } else {
                "Google Fit is configured but not connected"
            };
            json_response(
                StatusCode::OK,
                &FitnessStatus {
                    configured,
                    connected,
                    message,
                },
            )
        }
        other => error_response(
            StatusCode::BAD_REQUEST,
            "Invalid action",
            &format!("Unknown action '{}'; use auth or status", other),
        ),
    }
}

/// GET /verify/fitness/callback?code=...
pub async fn fitness_callback(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let dashboard = format!("{}/dashboard", state.args.app_url.trim_end_matches('/'));
    let failed = |reason: &str| {
        redirect_response(
            &format!("{}?fitness_error={}", dashboard, urlencoding::encode(reason)),
            &[],
        )
    };

    let query: CallbackQuery = match parse_query(req) {
        Ok(q) => q,
        Err(_) => return failed("invalid_callback"),
    };
    if let Some(error) = non_blank(query.error) {
        warn!(error = %error, "Google Fit consent denied");
        return failed(&error);
    }
    let Some(code) = non_blank(query.code) else {
        return failed("missing_code");
    };

    match state.oauth.exchange_code(&code).await {
        Ok(grant) => {
            let mut cookies = vec![token_cookie(
                ACCESS_TOKEN_COOKIE,
                &grant.access_token,
                grant.lifetime_secs(),
                state.args.dev_mode,
            )];
            if let Some(refresh) = &grant.refresh_token {
                cookies.push(token_cookie(
                    REFRESH_TOKEN_COOKIE,
                    refresh,
                    REFRESH_TOKEN_LIFETIME_SECS,
                    state.args.dev_mode,
                ));
            }
            info!("Google Fit connected");
            redirect_response(&format!("{}?fitness_connected=true", dashboard), &cookies)
        }
        Err(err) => {
            warn!(error = %err, "Google Fit code exchange failed");
            failed("token_exchange_failed")
        }
    }
}

fn token_cookie(name: &str, value: &str, max_age: u64, dev_mode: bool) -> String {
    let secure = if dev_mode { "" } else { "; Secure" };
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax{}",
        name, value, max_age, secure
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie(ACCESS_TOKEN_COOKIE, "tok", 3600, false);
        assert_eq!(
            cookie,
            "google_fit_access_token=tok; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax; Secure"
        );
        assert!(!token_cookie(REFRESH_TOKEN_COOKIE, "r", 1, true).contains("Secure"));
    }
}
