//! Per-request verification context.

use chrono::{NaiveDate, Utc};
use goalforge_ledger::HabitType;
use serde::Serialize;
use serde_json::Value;

/// Where a piece of structured evidence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    GitHub,
    Fitness,
}

impl EvidenceKind {
    /// Heading used when the evidence is shown to the judge
    pub fn label(self) -> &'static str {
        match self {
            EvidenceKind::GitHub => "GitHub Activity Data",
            EvidenceKind::Fitness => "Fitness Tracker Data",
        }
    }
}

/// Structured evidence gathered by a checker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub data: Value,
}

impl Evidence {
    pub fn new(kind: EvidenceKind, data: Value) -> Self {
        Self { kind, data }
    }
}

/// Everything known about one verification attempt. Lives only for the
/// duration of the request.
#[derive(Debug, Clone)]
pub struct VerificationContext {
    pub habit: HabitType,
    /// Target day (UTC)
    pub date: NaiveDate,
    pub handle: Option<String>,
    pub proof_text: Option<String>,
    pub proof_image_url: Option<String>,
    pub fitness_access_token: Option<String>,
    pub wallet_address: Option<String>,
    /// Evidence collected so far, in stage order
    pub evidence: Vec<Evidence>,
}

impl VerificationContext {
    pub fn new(habit: HabitType, date: NaiveDate) -> Self {
        Self {
            habit,
            date,
            handle: None,
            proof_text: None,
            proof_image_url: None,
            fitness_access_token: None,
            wallet_address: None,
            evidence: Vec::new(),
        }
    }

    /// Context for today's date (UTC)
    pub fn today(habit: HabitType) -> Self {
        Self::new(habit, Utc::now().date_naive())
    }

    pub fn with_handle(mut self, handle: Option<String>) -> Self {
        self.handle = non_blank(handle);
        self
    }

    pub fn with_proof_text(mut self, text: Option<String>) -> Self {
        self.proof_text = non_blank(text);
        self
    }

    pub fn with_proof_image(mut self, url: Option<String>) -> Self {
        self.proof_image_url = non_blank(url);
        self
    }

    pub fn with_fitness_token(mut self, token: Option<String>) -> Self {
        self.fitness_access_token = non_blank(token);
        self
    }

    pub fn with_wallet(mut self, wallet: Option<String>) -> Self {
        self.wallet_address = non_blank(wallet);
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    pub fn evidence_of(&self, kind: EvidenceKind) -> Option<&Value> {
        self.evidence.iter().find(|e| e.kind == kind).map(|e| &e.data)
    }

    /// True when the judge has anything at all to look at.
    pub fn has_evidence(&self) -> bool {
        self.proof_text.is_some() || self.proof_image_url.is_some() || !self.evidence.is_empty()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_inputs_are_absent() {
        let ctx = VerificationContext::today(HabitType::Coding)
            .with_handle(Some("  ".into()))
            .with_proof_text(Some(String::new()));
        assert!(ctx.handle.is_none());
        assert!(!ctx.has_evidence());
    }

    #[test]
    fn test_collected_evidence_counts() {
        let ctx = VerificationContext::today(HabitType::Gym)
            .with_evidence(Evidence::new(EvidenceKind::Fitness, serde_json::json!({"steps": 10})));
        assert!(ctx.has_evidence());
        assert_eq!(ctx.evidence_of(EvidenceKind::Fitness).unwrap()["steps"], 10);
        assert!(ctx.evidence_of(EvidenceKind::GitHub).is_none());
    }
}
