//! Ledger endpoints
//!
//! Mutations run as tracked submissions (`idle → submitting → confirming →
//! done|failed`) under the ledger lock; the response carries the final
//! submission so clients never have to reload to learn the outcome.
//! Reads return views straight from the ledger.

use bytes::Bytes;
use goalforge_ledger::{
    amount_string, AccountId, AchievementToken, Goal, GoalLedger, Submission, SubmissionError,
    TokenAmount, TxContext, TxPhase,
};
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{error_response, json_response, non_blank, parse_json_body, parse_query};
use crate::server::{AppState, LedgerState};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct OnboardRequest {
    account: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateHabitRequest {
    account: Option<String>,
    habit_type: u8,
    total_days: u32,
    lives: u8,
    #[serde(with = "amount_string")]
    stake: TokenAmount,
    #[serde(default)]
    verification_handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInRequest {
    account: Option<String>,
    goal_index: usize,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct TransferRequest {
    account: Option<String>,
    to: String,
    #[serde(with = "amount_string")]
    amount: TokenAmount,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    offset: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalsPage<'a> {
    total: usize,
    offset: usize,
    limit: usize,
    goals: Vec<&'a Goal>,
}

// =============================================================================
// Submission Runner
// =============================================================================

/// Drive one transaction through the submission phases.
fn run_submission<T, F>(
    state: &mut LedgerState,
    kind: &str,
    op: F,
) -> Result<Submission, SubmissionError>
where
    T: Serialize,
    F: FnOnce(&mut GoalLedger) -> goalforge_ledger::Result<T>,
{
    let id = state.submissions.create(kind);
    state.submissions.advance(id, TxPhase::Submitting)?;

    let submission = match op(&mut state.ledger) {
        Ok(value) => {
            state.submissions.advance(id, TxPhase::Confirming)?;
            let result = serde_json::to_value(&value).unwrap_or(Value::Null);
            state.submissions.finish(id, result)?
        }
        Err(err) => {
            warn!(kind, code = err.code(), error = %err, "Ledger transaction rejected");
            state.submissions.fail(id, &err)?
        }
    };
    Ok(submission.clone())
}

async fn submit<T, F>(state: &AppState, kind: &str, op: F) -> Response<Full<Bytes>>
where
    T: Serialize,
    F: FnOnce(&mut GoalLedger) -> goalforge_ledger::Result<T>,
{
    let mut guard = state.ledger.lock().await;
    match run_submission(&mut guard, kind, op) {
        Ok(submission) => {
            info!(
                kind,
                submission = %submission.id,
                phase = ?submission.phase,
                "Ledger submission settled"
            );
            json_response(StatusCode::ACCEPTED, &submission)
        }
        Err(err) => {
            error!(kind, error = %err, "Submission tracking failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Submission tracking failed",
                &err.to_string(),
            )
        }
    }
}

fn require_account(account: Option<String>) -> Result<AccountId, Response<Full<Bytes>>> {
    non_blank(account).map(AccountId::new).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "account is required",
            "Identify the calling account",
        )
    })
}

// =============================================================================
// Transactions
// =============================================================================

/// POST /ledger/onboard
pub async fn ledger_onboard(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: OnboardRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let account = match require_account(body.account) {
        Ok(a) => a,
        Err(response) => return response,
    };

    let ctx = TxContext::new(account);
    submit(state, "onboard", |ledger| {
        ledger
            .onboard(&ctx)
            .map(|granted| json!({ "granted": granted.to_string() }))
    })
    .await
}

/// POST /ledger/habits
pub async fn ledger_create_habit(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: CreateHabitRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let account = match require_account(body.account) {
        Ok(a) => a,
        Err(response) => return response,
    };

    let ctx = TxContext::new(account);
    submit(state, "create_habit", |ledger| {
        ledger
            .create_habit(
                &ctx,
                body.habit_type,
                body.total_days,
                body.lives,
                body.stake,
                body.verification_handle,
            )
            .map(|index| json!({ "goalIndex": index }))
    })
    .await
}

/// POST /ledger/check-in
pub async fn ledger_check_in(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: CheckInRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let account = match require_account(body.account) {
        Ok(a) => a,
        Err(response) => return response,
    };

    let ctx = TxContext::new(account);
    submit(state, "check_in", |ledger| {
        ledger.check_in(&ctx, body.goal_index, body.success)
    })
    .await
}

/// POST /ledger/transfer
pub async fn ledger_transfer(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let body: TransferRequest = match parse_json_body(req) {
        Ok(b) => b,
        Err(response) => return response,
    };
    let account = match require_account(body.account) {
        Ok(a) => a,
        Err(response) => return response,
    };
    let Some(to) = non_blank(Some(body.to)).map(AccountId::new) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "to is required",
            "Name the receiving account",
        );
    };

    let ctx = TxContext::new(account);
    let amount = body.amount;
    submit(state, "transfer", |ledger| {
        ledger
            .transfer(&ctx, &to, amount)
            .map(|()| json!({ "to": to, "amount": amount.to_string() }))
    })
    .await
}

// =============================================================================
// Reads
// =============================================================================

/// GET /ledger/submissions/{id}
pub async fn ledger_submission(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    let Ok(id) = Uuid::parse_str(id) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Invalid submission id",
            "Submission ids are UUIDs",
        );
    };

    let guard = state.ledger.lock().await;
    match guard.submissions.get(id) {
        Some(submission) => json_response(StatusCode::OK, submission),
        None => error_response(
            StatusCode::NOT_FOUND,
            "Submission not found",
            &format!("No submission {}", id),
        ),
    }
}

/// GET /ledger/goals?user=
pub async fn ledger_user_goals(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let query: UserQuery = match parse_query(req) {
        Ok(q) => q,
        Err(response) => return response,
    };
    let user = match require_user(query.user) {
        Ok(u) => u,
        Err(response) => return response,
    };

    let guard = state.ledger.lock().await;
    json_response(
        StatusCode::OK,
        &json!({ "user": user, "goals": guard.ledger.user_goals(&user) }),
    )
}

/// GET /ledger/goals/all?offset=&limit=
pub async fn ledger_all_goals(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let query: PageQuery = match parse_query(req) {
        Ok(q) => q,
        Err(response) => return response,
    };
    let offset = query.offset.unwrap_or(0);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let guard = state.ledger.lock().await;
    let page = GoalsPage {
        total: guard.ledger.goal_count(),
        offset,
        limit,
        goals: guard
            .ledger
            .all_goals_page(offset, limit)
            .into_iter()
            .map(|(_, goal)| goal)
            .collect(),
    };
    json_response(StatusCode::OK, &page)
}

/// GET /ledger/achievements?user=
pub async fn ledger_achievements(state: &AppState, req: &Request<Bytes>) -> Response<Full<Bytes>> {
    let query: UserQuery = match parse_query(req) {
        Ok(q) => q,
        Err(response) => return response,
    };
    let user = match require_user(query.user) {
        Ok(u) => u,
        Err(response) => return response,
    };

    let guard = state.ledger.lock().await;
    let ledger = &guard.ledger;
    let tokens: Vec<&AchievementToken> = ledger
        .user_achievements(&user)
        .into_iter()
        .filter_map(|id| ledger.minter().token(id))
        .collect();
    json_response(
        StatusCode::OK,
        &json!({ "user": user, "achievements": tokens }),
    )
}

/// GET /ledger/accounts/{id}
pub async fn ledger_account(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    let decoded = urlencoding::decode(id)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| id.to_string());
    let Some(account) = non_blank(Some(decoded)).map(AccountId::new) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "account is required",
            "Use /ledger/accounts/{account}",
        );
    };

    let guard = state.ledger.lock().await;
    json_response(StatusCode::OK, &guard.ledger.account(&account))
}

fn require_user(user: Option<String>) -> Result<AccountId, Response<Full<Bytes>>> {
    non_blank(user).map(AccountId::new).ok_or_else(|| {
        error_response(
            StatusCode::BAD_REQUEST,
            "user is required",
            "Pass ?user=<account>",
        )
    })
}
