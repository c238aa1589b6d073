use crate::types::{AccountId, TokenAmount};

/// Why a goal could not be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidParameter {
    #[error("Days must be greater than 0")]
    ZeroDays,

    #[error("Maximum 5 lives allowed")]
    TooManyLives,

    #[error("Stake must be greater than 0")]
    ZeroStake,

    #[error("Unknown habit type {0}")]
    UnknownHabit(u8),
}

/// Errors from ledger transactions.
///
/// Any error means the transaction was rejected as a whole; no balance,
/// goal, stake, token or event was written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("User has already onboarded")]
    AlreadyOnboarded,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] InvalidParameter),

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("Invalid goal index {index} for {owner}")]
    InvalidGoalIndex { owner: AccountId, index: usize },

    #[error("Goal {index} of {owner} is already finalized")]
    GoalFinalized { owner: AccountId, index: usize },

    #[error("{caller} is not authorized to mint achievements")]
    UnauthorizedMinter { caller: AccountId },

    #[error("Achievement tokens are not transferable")]
    NonTransferable,

    #[error("{caller} does not own achievement {token_id}")]
    NotTokenOwner { caller: AccountId, token_id: u64 },

    #[error("Unknown achievement token {0}")]
    UnknownToken(u64),

    #[error("{account} is reserved for the ledger and cannot sign transactions")]
    ReservedAccount { account: AccountId },

    #[error("Arithmetic overflow")]
    Overflow,
}

impl LedgerError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AlreadyOnboarded => "already_onboarded",
            LedgerError::InvalidParameters(_) => "invalid_parameters",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::InvalidGoalIndex { .. } => "invalid_goal_index",
            LedgerError::GoalFinalized { .. } => "goal_finalized",
            LedgerError::UnauthorizedMinter { .. } => "unauthorized_minter",
            LedgerError::NonTransferable => "non_transferable",
            LedgerError::NotTokenOwner { .. } => "not_token_owner",
            LedgerError::UnknownToken(_) => "unknown_token",
            LedgerError::ReservedAccount { .. } => "reserved_account",
            LedgerError::Overflow => "overflow",
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
