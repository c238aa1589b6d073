//! Core ledger records.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::habit::HabitType;

/// Token amounts in base units (18 decimals).
pub type TokenAmount = u128;

/// One whole GOAL token in base units.
pub const ONE_TOKEN: TokenAmount = 1_000_000_000_000_000_000;

/// Maximum number of lives a goal may start with.
pub const MAX_LIVES: u8 = 5;

/// Completion bonus, in percent of the stake.
pub const BONUS_RATE_PERCENT: TokenAmount = 10;

/// Account identity: a wallet address or any opaque caller id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Execution context of a ledger transaction: who is calling and when.
#[derive(Debug, Clone)]
pub struct TxContext {
    pub caller: AccountId,
    pub timestamp: DateTime<Utc>,
}

impl TxContext {
    /// Context stamped with the current time
    pub fn new(caller: impl Into<AccountId>) -> Self {
        Self {
            caller: caller.into(),
            timestamp: Utc::now(),
        }
    }

    /// Context with an explicit timestamp
    pub fn at(caller: impl Into<AccountId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            caller: caller.into(),
            timestamp,
        }
    }
}

/// Stable address of a goal: its owner plus position in the owner's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRef {
    pub owner: AccountId,
    pub index: usize,
}

/// Lifecycle state derived from a goal's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Failed,
}

/// A staked commitment to a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub owner: AccountId,
    pub habit_type: HabitType,
    pub title: String,
    pub description: String,
    /// External handle used by verifiers, e.g. a GitHub username
    pub verification_handle: String,
    #[serde(with = "amount_string")]
    pub stake: TokenAmount,
    pub total_days: u32,
    pub progress: u32,
    pub lives_left: u8,
    pub current_streak: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub completed: bool,
    /// Terminal flag: set once the goal has completed or failed
    pub verified: bool,
}

impl Goal {
    pub(crate) fn open(
        owner: AccountId,
        habit_type: HabitType,
        total_days: u32,
        lives: u8,
        stake: TokenAmount,
        verification_handle: String,
        start: DateTime<Utc>,
    ) -> Self {
        let profile = habit_type.profile();
        Self {
            owner,
            habit_type,
            title: profile.title.to_string(),
            description: profile.description.to_string(),
            verification_handle,
            stake,
            total_days,
            progress: 0,
            lives_left: lives,
            current_streak: 0,
            start_date: start,
            end_date: start + Duration::days(i64::from(total_days)),
            completed: false,
            verified: false,
        }
    }

    pub fn status(&self) -> GoalStatus {
        match (self.verified, self.completed) {
            (false, _) => GoalStatus::Active,
            (true, true) => GoalStatus::Completed,
            (true, false) => GoalStatus::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.verified
    }
}

/// What a check-in did to its goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckInOutcome {
    Progressed {
        progress: u32,
        streak: u32,
    },
    LifeLost {
        lives_left: u8,
    },
    Completed {
        #[serde(with = "amount_string")]
        payout: TokenAmount,
        #[serde(with = "amount_string")]
        bonus: TokenAmount,
        token_id: u64,
    },
    Failed {
        #[serde(with = "amount_string")]
        burned: TokenAmount,
    },
}

/// Completion bonus for a stake: `floor(stake * 10 / 100)`.
pub fn completion_bonus(stake: TokenAmount) -> TokenAmount {
    stake / 100 * BONUS_RATE_PERCENT + stake % 100 * BONUS_RATE_PERCENT / 100
}

/// Serializes token amounts as decimal strings; JSON numbers cannot carry u128.
pub mod amount_string {
    use super::TokenAmount;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &TokenAmount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TokenAmount, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.trim().parse().map_err(de::Error::custom),
            Repr::Number(n) => Ok(TokenAmount::from(n)),
        }
    }
}
