//! Verification orchestrator
//!
//! Runs an ordered list of [`Verifier`] stages, cheapest and most trusted
//! first, then falls back to the proof judge.
//!
//! ```text
//! github ──verified──▶ done (github_auto)
//!   │ not verified / failed / skipped
//!   ▼
//! google_fit ──verified──▶ done (google_fit_auto)
//!   │
//!   ▼
//! any evidence? ──yes──▶ judge (llm, accepted at ≥ 60% confidence)
//!   │ no
//!   ▼
//! "No proof submitted" (none)
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::{EvidenceKind, VerificationContext};
use crate::error::{Result, VerifyError};
use crate::judge::LlmProofJudge;
use crate::step::{StageReport, StepResult, VerificationMethod, VerificationOutcome};

/// Minimum judge confidence for acceptance
pub const ACCEPT_CONFIDENCE: u8 = 60;

/// Service name of the judge in step trails
pub const JUDGE_SERVICE: &str = "llm";

/// One automatic evidence check.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Name recorded in the step trail.
    fn service(&self) -> &'static str;

    /// Method reported when this stage verifies.
    fn method(&self) -> VerificationMethod;

    /// Whether the stage has what it needs to run.
    fn applies(&self, ctx: &VerificationContext) -> bool;

    async fn check(&self, ctx: &VerificationContext) -> Result<StageReport>;
}

pub struct VerificationOrchestrator {
    stages: Vec<Arc<dyn Verifier>>,
    judge: Arc<LlmProofJudge>,
}

impl VerificationOrchestrator {
    pub fn new(stages: Vec<Arc<dyn Verifier>>, judge: Arc<LlmProofJudge>) -> Self {
        Self { stages, judge }
    }

    pub async fn verify(&self, mut ctx: VerificationContext) -> Result<VerificationOutcome> {
        let mut outcome = VerificationOutcome {
            final_verified: false,
            verification_method: VerificationMethod::None,
            summary: String::new(),
            needs_reauth: false,
            steps: Vec::new(),
            github: None,
            fitness: None,
            llm: None,
        };

        for stage in &self.stages {
            if !stage.applies(&ctx) {
                continue;
            }
            let service = stage.service();

            match stage.check(&ctx).await {
                Ok(report) => {
                    debug!(service, verified = report.verified, "Stage finished");
                    outcome.steps.push(StepResult::from_report(service, &report));
                    if let Some(evidence) = report.evidence {
                        match evidence.kind {
                            EvidenceKind::GitHub => outcome.github = Some(evidence.data.clone()),
                            EvidenceKind::Fitness => outcome.fitness = Some(evidence.data.clone()),
                        }
                        ctx.evidence.push(evidence);
                    }

                    if report.verified {
                        outcome.final_verified = true;
                        outcome.verification_method = stage.method();
                        outcome.summary =
                            format!("Verified via {}: {}", display_name(service), report.summary);
                        info!(service, habit = %ctx.habit, "Verified automatically");
                        return Ok(outcome);
                    }
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(service, error = %err, "Stage failed");
                    outcome.needs_reauth |= matches!(err, VerifyError::NeedsReauth);
                    outcome.steps.push(StepResult::failed(service, &err));
                }
            }
        }

        if !ctx.has_evidence() {
            outcome.summary = VerifyError::NoEvidence.user_message();
            return Ok(outcome);
        }

        match self.judge.judge(&ctx).await {
            Ok(report) => {
                let accepted = report.verified && report.confidence >= ACCEPT_CONFIDENCE;
                outcome.steps.push(StepResult::judged(
                    JUDGE_SERVICE,
                    report.verified,
                    report.confidence,
                    &report.reason,
                ));
                outcome.final_verified = accepted;
                outcome.verification_method = VerificationMethod::Llm;
                outcome.summary = if accepted {
                    format!(
                        "Verified by AI ({}% confidence): {}",
                        report.confidence, report.reason
                    )
                } else {
                    report.reason.clone()
                };
                outcome.llm = serde_json::to_value(&report).ok();
                info!(
                    habit = %ctx.habit,
                    accepted,
                    confidence = report.confidence,
                    "Judge decided"
                );
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(error = %err, "Judge unavailable");
                outcome.steps.push(StepResult::failed(JUDGE_SERVICE, &err));
                outcome.summary = err.user_message();
            }
        }

        Ok(outcome)
    }
}

fn display_name(service: &str) -> &str {
    match service {
        "github" => "GitHub",
        "google_fit" => "Google Fit",
        other => other,
    }
}
