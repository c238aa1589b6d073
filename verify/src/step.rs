//! Step trail and consolidated outcome of a verification.

use serde::Serialize;
use serde_json::Value;

use crate::context::Evidence;
use crate::error::VerifyError;

/// How a verification was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    GithubAuto,
    GoogleFitAuto,
    Llm,
    None,
}

/// What a stage found.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub verified: bool,
    pub summary: String,
    /// Full checker result, passed on to later stages
    pub evidence: Option<Evidence>,
}

/// One entry of the step trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub service: String,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_reauth: bool,
}

impl StepResult {
    pub fn from_report(service: &str, report: &StageReport) -> Self {
        Self {
            service: service.to_string(),
            verified: report.verified,
            confidence: None,
            summary: Some(report.summary.clone()),
            reason: None,
            error: None,
            needs_reauth: false,
        }
    }

    pub fn judged(service: &str, verified: bool, confidence: u8, reason: &str) -> Self {
        Self {
            service: service.to_string(),
            verified,
            confidence: Some(confidence),
            summary: None,
            reason: Some(reason.to_string()),
            error: None,
            needs_reauth: false,
        }
    }

    pub fn failed(service: &str, err: &VerifyError) -> Self {
        Self {
            service: service.to_string(),
            verified: false,
            confidence: None,
            summary: None,
            reason: None,
            error: Some(err.user_message()),
            needs_reauth: matches!(err, VerifyError::NeedsReauth),
        }
    }
}

/// Consolidated verdict plus the audit trail that produced it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub final_verified: bool,
    pub verification_method: VerificationMethod,
    pub summary: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_reauth: bool,
    pub steps: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitness: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<Value>,
}

impl VerificationOutcome {
    pub fn has_step(&self, service: &str) -> bool {
        self.steps.iter().any(|s| s.service == service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_step_serialization() {
        let step = StepResult::failed("google_fit", &VerifyError::NeedsReauth);
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["service"], "google_fit");
        assert_eq!(json["verified"], false);
        assert_eq!(json["needsReauth"], true);
        assert!(json["error"].as_str().unwrap().contains("reconnect"));
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn test_method_wire_names() {
        let json = serde_json::to_value(VerificationMethod::GoogleFitAuto).unwrap();
        assert_eq!(json, "google_fit_auto");
        let json = serde_json::to_value(VerificationMethod::GithubAuto).unwrap();
        assert_eq!(json, "github_auto");
    }
}
