//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Request bodies are
//! collected (with a size cap) before routing so handlers work on plain
//! `Request<Bytes>` values.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use goalforge_ledger::{GoalLedger, SubmissionTracker};
use goalforge_verify::{
    FitnessChecker, GitHubChecker, GoogleFitOAuth, LlmProofJudge, VerificationOrchestrator,
    Verifier,
};

use crate::config::Args;
use crate::routes;
use crate::types::GatewayError;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Ledger plus the submissions driven against it. Guarded by one lock so
/// every transaction is applied in isolation.
pub struct LedgerState {
    pub ledger: GoalLedger,
    pub submissions: SubmissionTracker,
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub github: Arc<GitHubChecker>,
    pub fitness: Arc<FitnessChecker>,
    pub oauth: GoogleFitOAuth,
    pub judge: Arc<LlmProofJudge>,
    pub orchestrator: VerificationOrchestrator,
    pub ledger: Mutex<LedgerState>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args) -> Self {
        let judge = Arc::new(LlmProofJudge::from_config(&args.judge_config()));
        Self::with_judge(args, judge)
    }

    /// State with a caller-supplied judge.
    pub fn with_judge(args: Args, judge: Arc<LlmProofJudge>) -> Self {
        let github = Arc::new(GitHubChecker::new(args.github_config()));
        let fitness = Arc::new(FitnessChecker::new(args.fitness_config()));
        let stages: Vec<Arc<dyn Verifier>> = vec![
            github.clone() as Arc<dyn Verifier>,
            fitness.clone() as Arc<dyn Verifier>,
        ];
        let orchestrator = VerificationOrchestrator::new(stages, Arc::clone(&judge));

        let ledger = LedgerState {
            ledger: GoalLedger::new(args.ledger_config()),
            submissions: SubmissionTracker::with_capacity(args.submission_capacity),
        };

        Self {
            oauth: GoogleFitOAuth::new(args.oauth_config()),
            github,
            fitness,
            judge,
            orchestrator,
            ledger: Mutex::new(ledger),
            started_at: Instant::now(),
            args,
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("GoalForge gateway listening on {}", state.args.listen);
    if state.args.dev_mode {
        warn!("Development mode enabled - cookies are not marked Secure");
    }
    if !state.judge.is_configured() {
        warn!("OPENROUTER_API_KEY not set - LLM proof verification disabled");
    }
    if !state.oauth.is_configured() {
        info!("Google Fit OAuth not configured - fitness checks need a client token");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Collect the body, then route
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());

    let (parts, body) = req.into_parts();
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Ok(routes::error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
                &format!("Bodies are limited to {} bytes", MAX_BODY_BYTES),
            ));
        }
        Err(e) => {
            warn!("Request body error: {}", e);
            return Ok(routes::error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
                &e.to_string(),
            ));
        }
    };

    Ok(dispatch(state, Request::from_parts(parts, bytes)).await)
}

/// Route a fully-read request
pub async fn dispatch(state: Arc<AppState>, req: Request<Bytes>) -> Response<Full<Bytes>> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        // CORS preflight
        (Method::OPTIONS, _) => routes::preflight_response(),

        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(&state),

        // ====================================================================
        // Verification
        // ====================================================================
        (Method::POST, "/verify/github") => routes::verify_github(&state, &req).await,
        (Method::POST, "/verify/fitness") => routes::verify_fitness(&state, &req).await,
        (Method::GET, "/verify/fitness") => routes::fitness_action(&state, &req),
        (Method::GET, "/verify/fitness/callback") => routes::fitness_callback(&state, &req).await,
        (Method::POST, "/verify/llm") => routes::verify_llm(&state, &req).await,
        (Method::POST, "/verify/task") => routes::verify_task(&state, &req).await,

        // ====================================================================
        // Ledger transactions
        // ====================================================================
        (Method::POST, "/ledger/onboard") => routes::ledger_onboard(&state, &req).await,
        (Method::POST, "/ledger/habits") => routes::ledger_create_habit(&state, &req).await,
        (Method::POST, "/ledger/check-in") => routes::ledger_check_in(&state, &req).await,
        (Method::POST, "/ledger/transfer") => routes::ledger_transfer(&state, &req).await,

        // ====================================================================
        // Ledger reads
        // ====================================================================
        (Method::GET, "/ledger/goals") => routes::ledger_user_goals(&state, &req).await,
        (Method::GET, "/ledger/goals/all") => routes::ledger_all_goals(&state, &req).await,
        (Method::GET, "/ledger/achievements") => routes::ledger_achievements(&state, &req).await,
        (Method::GET, p) if p.starts_with("/ledger/submissions/") => {
            let id = &p["/ledger/submissions/".len()..];
            routes::ledger_submission(&state, id).await
        }
        (Method::GET, p) if p.starts_with("/ledger/accounts/") => {
            let id = &p["/ledger/accounts/".len()..];
            routes::ledger_account(&state, id).await
        }

        _ => routes::not_found_response(&path),
    }
}
