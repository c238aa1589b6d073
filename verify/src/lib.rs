//! GoalForge verification pipeline
//!
//! Decides from untrusted evidence whether a day's habit task was really
//! done. Automatic checkers run first; a language-model judge reviews
//! whatever evidence remains.
//!
//! # Key Components
//!
//! - [`GitHubChecker`]: Public events feed plus contribution graph for code habits
//! - [`FitnessChecker`]: Google Fit sessions and aggregates for fitness habits
//! - [`GoogleFitOAuth`]: Consent URL and authorization-code exchange
//! - [`LlmProofJudge`]: Structured verdicts from a chat-completions backend
//! - [`VerificationOrchestrator`]: Sequential stages with short-circuiting
//!
//! # Example
//!
//! ```ignore
//! use goalforge_verify::{VerificationContext, VerificationOrchestrator};
//!
//! let ctx = VerificationContext::today(HabitType::Coding)
//!     .with_handle(Some("octocat".into()));
//! let outcome = orchestrator.verify(ctx).await?;
//! ```

pub mod client;
pub mod context;
pub mod error;
pub mod fitness;
pub mod github;
pub mod judge;
pub mod oauth;
pub mod orchestrator;
pub mod step;

pub use context::{Evidence, EvidenceKind, VerificationContext};
pub use error::{Result, VerifyError};
pub use fitness::{FitnessChecker, FitnessConfig, FitnessReport};
pub use github::{GitHubChecker, GitHubConfig, GitHubReport};
pub use judge::{JudgeConfig, JudgeReport, LlmBackend, LlmProofJudge, MockBackend, OpenAiBackend};
pub use oauth::{GoogleFitOAuth, OAuthConfig, TokenGrant};
pub use orchestrator::{VerificationOrchestrator, Verifier, ACCEPT_CONFIDENCE};
pub use step::{StageReport, StepResult, VerificationMethod, VerificationOutcome};
