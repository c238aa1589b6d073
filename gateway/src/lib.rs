//! GoalForge gateway
//!
//! HTTP surface over the verification pipeline and the habit-staking
//! ledger.
//!
//! ## Services
//!
//! - **Verification**: GitHub and Google Fit checks, the LLM proof judge and
//!   orchestrated task verification under `/verify/*`
//! - **Google Fit OAuth**: consent redirect and code exchange into HttpOnly
//!   token cookies
//! - **Ledger**: tracked onboarding, goal creation, check-ins and transfers
//!   under `/ledger/*`

pub mod config;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{dispatch, run, AppState};
pub use types::{GatewayError, Result};
