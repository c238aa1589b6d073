//! HTTP route handlers
//!
//! - `/health` - liveness probe
//! - `/verify/*` - evidence checks, the proof judge and full task verification
//! - `/ledger/*` - tracked ledger transactions and read views

pub mod fitness;
pub mod health;
pub mod ledger;
pub mod verify;

pub use fitness::{fitness_action, fitness_callback, verify_fitness};
pub use health::health_check;
pub use ledger::{
    ledger_account, ledger_achievements, ledger_all_goals, ledger_check_in, ledger_create_habit,
    ledger_onboard, ledger_submission, ledger_transfer, ledger_user_goals,
};
pub use verify::{verify_github, verify_llm, verify_task};

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use goalforge_ledger::HabitType;
use goalforge_verify::VerifyError;
use http_body_util::Full;
use hyper::header::{self, HeaderValue};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

// =============================================================================
// Response Helpers
// =============================================================================

fn with_cors(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    with_cors(response)
}

/// `{error, message}` body
pub fn error_response(status: StatusCode, error: &str, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": error, "message": message }))
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = with_cors(Response::new(Full::new(Bytes::new())));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    response
}

pub fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({ "error": "Not Found", "path": path }),
    )
}

/// 302 to `location`, setting each cookie.
pub fn redirect_response(location: &str, cookies: &[String]) -> Response<Full<Bytes>> {
    let Ok(location) = HeaderValue::from_str(location) else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid redirect target",
            "The redirect location could not be encoded",
        );
    };

    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::FOUND;
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Map a pipeline error to its HTTP status and `{error, message}` body.
pub fn verify_error_response(err: &VerifyError) -> Response<Full<Bytes>> {
    let (status, error) = match err {
        VerifyError::Configuration(what) => (StatusCode::NOT_IMPLEMENTED, what.clone()),
        VerifyError::UnknownUser(_) => (StatusCode::NOT_FOUND, "GitHub user not found".into()),
        VerifyError::NeedsReauth => {
            return json_response(
                StatusCode::UNAUTHORIZED,
                &json!({
                    "error": "Google Fit token expired",
                    "message": err.user_message(),
                    "needsReauth": true,
                }),
            );
        }
        VerifyError::UnsupportedHabit(_) => (
            StatusCode::BAD_REQUEST,
            "Habit type does not support fitness verification".into(),
        ),
        VerifyError::NoEvidence => (
            StatusCode::BAD_REQUEST,
            "No proof provided for verification".into(),
        ),
        VerifyError::UnparseableVerdict(_) => (
            StatusCode::BAD_GATEWAY,
            "Failed to parse verification response".into(),
        ),
        VerifyError::Network(_) | VerifyError::InvalidResponse(_) => {
            (StatusCode::BAD_GATEWAY, "Verification upstream unavailable".into())
        }
        VerifyError::Upstream { service, .. } => {
            (StatusCode::BAD_GATEWAY, format!("{} request failed", service))
        }
    };
    error_response(status, &error, &err.user_message())
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Parse a JSON body. An empty body reads as `{}`.
pub(crate) fn parse_json_body<T: DeserializeOwned>(
    req: &Request<Bytes>,
) -> Result<T, Response<Full<Bytes>>> {
    let body: &[u8] = if req.body().is_empty() {
        b"{}"
    } else {
        req.body()
    };
    serde_json::from_slice(body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, "Invalid JSON", &e.to_string())
    })
}

pub(crate) fn parse_query<T: DeserializeOwned>(
    req: &Request<Bytes>,
) -> Result<T, Response<Full<Bytes>>> {
    let query = req.uri().query().unwrap_or("");
    serde_urlencoded::from_str(query).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "Invalid query parameters",
            &e.to_string(),
        )
    })
}

/// Value of a request cookie.
pub(crate) fn cookie(req: &Request<Bytes>, name: &str) -> Option<String> {
    req.headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Habit codes arrive as numbers or numeric strings.
pub(crate) fn parse_habit(value: Option<&Value>) -> Option<HabitType> {
    let code = match value? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    HabitType::from_code(u8::try_from(code).ok()?)
}

pub(crate) fn invalid_habit_response() -> Response<Full<Bytes>> {
    error_response(
        StatusCode::BAD_REQUEST,
        "Invalid habit type",
        "habitType must be one of 0 (Coding), 1 (DSA), 2 (Gym), 3 (Yoga), 4 (Running)",
    )
}

/// Target day: `YYYY-MM-DD` or an RFC 3339 timestamp, defaulting to today (UTC).
pub(crate) fn parse_date(raw: Option<&str>) -> Result<NaiveDate, Response<Full<Bytes>>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Utc::now().date_naive());
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                "Invalid date",
                "Use YYYY-MM-DD or an RFC 3339 timestamp",
            )
        })
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
