//! GoalForge ledger
//!
//! The escrow and state-machine authority for staked habit goals:
//!
//! - **Onboarding**: a one-time starter grant per account
//! - **Staking**: tokens escrowed against a goal at creation
//! - **Check-ins**: daily verdicts that advance, penalize, complete or fail a goal
//! - **Achievements**: a commemorative token minted for every completed goal
//!
//! # Key Components
//!
//! - [`GoalLedger`]: Balances, goals, stakes and the event log
//! - [`AchievementMinter`]: Token registry whose only authorized caller is the ledger
//! - [`HabitType`] / [`HabitProfile`]: The habit table shared with the verification pipeline
//! - [`SubmissionTracker`]: Client-visible phases of submitted transactions
//!
//! # Example
//!
//! ```ignore
//! use goalforge_ledger::{GoalLedger, TxContext, ONE_TOKEN};
//!
//! let mut ledger = GoalLedger::default();
//! let ctx = TxContext::new("0xabc");
//! ledger.onboard(&ctx)?;
//! let index = ledger.create_habit(&ctx, 2, 3, 2, 10 * ONE_TOKEN, "")?;
//! let outcome = ledger.check_in(&ctx, index, true)?;
//! ```

pub mod error;
pub mod events;
pub mod habit;
pub mod ledger;
pub mod minter;
pub mod submission;
pub mod types;

pub use error::{InvalidParameter, LedgerError, Result};
pub use events::{LedgerEvent, LedgerEventKind};
pub use habit::{FitnessPolicy, HabitProfile, HabitType, UnknownHabitCode};
pub use ledger::{AccountSnapshot, GoalLedger, LedgerConfig};
pub use minter::{AchievementMinter, AchievementToken};
pub use submission::{
    Submission, SubmissionError, SubmissionFailure, SubmissionTracker, TxPhase,
    DEFAULT_SUBMISSION_CAPACITY,
};
pub use types::*;
