//! Verification errors.

use goalforge_ledger::HabitType;

/// Errors from checkers, the judge and the orchestrator.
///
/// Only [`VerifyError::Configuration`] and [`VerifyError::UnparseableVerdict`]
/// abort an orchestrated verification; every other variant is recorded as a
/// failed step and the pipeline moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerifyError {
    /// A required credential or endpoint is not configured
    #[error("Not configured: {0}")]
    Configuration(String),

    #[error("GitHub user not found: {0}")]
    UnknownUser(String),

    /// The provider rejected the access token
    #[error("Access token expired or revoked")]
    NeedsReauth,

    #[error("Habit {0} is not supported by this checker")]
    UnsupportedHabit(HabitType),

    #[error("No proof provided for verification")]
    NoEvidence,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} returned HTTP {status}")]
    Upstream { service: &'static str, status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Could not parse verdict: {0}")]
    UnparseableVerdict(String),
}

impl VerifyError {
    /// Errors that end an orchestrated verification instead of becoming a step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VerifyError::Configuration(_) | VerifyError::UnparseableVerdict(_)
        )
    }

    /// Plain-language message safe to show to end users. Never includes
    /// provider payloads.
    pub fn user_message(&self) -> String {
        match self {
            VerifyError::Configuration(_) => {
                "This verification service is not configured.".to_string()
            }
            VerifyError::UnknownUser(user) => format!("GitHub user '{}' was not found.", user),
            VerifyError::NeedsReauth => {
                "Your fitness connection has expired. Please reconnect Google Fit.".to_string()
            }
            VerifyError::UnsupportedHabit(habit) => {
                format!("{} activity cannot be checked with a fitness tracker.", habit)
            }
            VerifyError::NoEvidence => {
                "No proof submitted. Please provide proof of task completion.".to_string()
            }
            VerifyError::Network(_) => {
                "The verification service could not be reached. Please try again later."
                    .to_string()
            }
            VerifyError::Upstream { service, .. } => {
                format!("The {} service returned an error. Please try again later.", service)
            }
            VerifyError::InvalidResponse(_) => {
                "The verification service sent a response we could not read.".to_string()
            }
            VerifyError::UnparseableVerdict(_) => {
                "The AI verifier returned an unreadable verdict.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VerifyError::InvalidResponse(err.to_string())
        } else {
            VerifyError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(VerifyError::Configuration("key".into()).is_fatal());
        assert!(VerifyError::UnparseableVerdict("x".into()).is_fatal());
        assert!(!VerifyError::NeedsReauth.is_fatal());
        assert!(!VerifyError::Network("reset".into()).is_fatal());
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = VerifyError::Network("tcp connect error: 10.0.0.1:443".into());
        assert!(!err.user_message().contains("10.0.0.1"));

        let err = VerifyError::InvalidResponse("{\"secret\":1}".into());
        assert!(!err.user_message().contains("secret"));
    }
}
