//! Client-visible transaction tracking.
//!
//! Each ledger mutation submitted through the gateway becomes a
//! [`Submission`] that moves `Idle -> Submitting -> Confirming -> Done`, or to
//! `Failed` from any non-terminal phase. Clients poll it by id.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::debug;
use uuid::Uuid;

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxPhase {
    Idle,
    Submitting,
    Confirming,
    Done,
    Failed,
}

impl TxPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxPhase::Done | TxPhase::Failed)
    }

    pub fn can_advance_to(self, next: TxPhase) -> bool {
        use TxPhase::*;
        matches!(
            (self, next),
            (Idle, Submitting) | (Submitting, Confirming) | (Confirming, Done)
        ) || (next == Failed && !self.is_terminal())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionFailure {
    pub code: String,
    pub message: String,
}

impl From<&LedgerError> for SubmissionFailure {
    fn from(err: &LedgerError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Uuid,
    pub kind: String,
    pub phase: TxPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SubmissionFailure>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Unknown submission {0}")]
    NotFound(Uuid),

    #[error("Cannot move submission from {from:?} to {to:?}")]
    InvalidTransition { from: TxPhase, to: TxPhase },
}

/// Finished submissions kept for polling before the oldest are evicted.
pub const DEFAULT_SUBMISSION_CAPACITY: usize = 10_000;

#[derive(Debug)]
pub struct SubmissionTracker {
    submissions: HashMap<Uuid, Submission>,
    /// Ids in creation order
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SUBMISSION_CAPACITY)
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` submissions. Only terminal ones are evicted,
    /// oldest first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            submissions: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a new submission in the `Idle` phase.
    pub fn create(&mut self, kind: impl Into<String>) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        self.submissions.insert(
            id,
            Submission {
                id,
                kind: kind.into(),
                phase: TxPhase::Idle,
                result: None,
                error: None,
                created_at: now,
                updated_at: now,
            },
        );
        self.order.push_back(id);
        self.evict();
        id
    }

    fn evict(&mut self) {
        while self.submissions.len() > self.capacity {
            let Some(pos) = self.order.iter().position(|id| {
                self.submissions
                    .get(id)
                    .map_or(true, |s| s.phase.is_terminal())
            }) else {
                break;
            };
            if let Some(id) = self.order.remove(pos) {
                self.submissions.remove(&id);
                debug!(submission = %id, "Submission evicted");
            }
        }
    }

    pub fn advance(&mut self, id: Uuid, next: TxPhase) -> Result<&Submission, SubmissionError> {
        let submission = self
            .submissions
            .get_mut(&id)
            .ok_or(SubmissionError::NotFound(id))?;
        if !submission.phase.can_advance_to(next) {
            return Err(SubmissionError::InvalidTransition {
                from: submission.phase,
                to: next,
            });
        }
        debug!(submission = %id, from = ?submission.phase, to = ?next, "Submission advanced");
        submission.phase = next;
        submission.updated_at = Utc::now();
        Ok(submission)
    }

    /// Mark a confirming submission done with its result.
    pub fn finish(
        &mut self,
        id: Uuid,
        result: serde_json::Value,
    ) -> Result<&Submission, SubmissionError> {
        self.advance(id, TxPhase::Done)?;
        let submission = self
            .submissions
            .get_mut(&id)
            .ok_or(SubmissionError::NotFound(id))?;
        submission.result = Some(result);
        Ok(submission)
    }

    pub fn fail(&mut self, id: Uuid, error: &LedgerError) -> Result<&Submission, SubmissionError> {
        self.advance(id, TxPhase::Failed)?;
        let submission = self
            .submissions
            .get_mut(&id)
            .ok_or(SubmissionError::NotFound(id))?;
        submission.error = Some(error.into());
        Ok(submission)
    }

    pub fn get(&self, id: Uuid) -> Option<&Submission> {
        self.submissions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}
