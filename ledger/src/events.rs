//! Ledger event log.
//!
//! Events are appended only after a transaction has fully validated, so the
//! log never contains an event for a rejected call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::HabitType;
use crate::types::{amount_string, AccountId, TokenAmount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEventKind {
    UserOnboarded {
        user: AccountId,
    },
    GoalCreated {
        user: AccountId,
        goal_index: usize,
        title: String,
        #[serde(with = "amount_string")]
        stake: TokenAmount,
        habit_type: HabitType,
    },
    GoalProgress {
        user: AccountId,
        goal_index: usize,
        progress: u32,
    },
    LifeLost {
        user: AccountId,
        goal_index: usize,
        lives_left: u8,
    },
    GoalCompleted {
        user: AccountId,
        goal_index: usize,
        #[serde(with = "amount_string")]
        stake: TokenAmount,
        #[serde(with = "amount_string")]
        bonus: TokenAmount,
    },
    GoalFailed {
        user: AccountId,
        goal_index: usize,
        #[serde(with = "amount_string")]
        stake: TokenAmount,
    },
    AchievementMinted {
        owner: AccountId,
        token_id: u64,
        habit_type: HabitType,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        #[serde(with = "amount_string")]
        amount: TokenAmount,
    },
}

/// A sequenced, timestamped event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

#[derive(Debug, Default)]
pub(crate) struct EventLog {
    events: Vec<LedgerEvent>,
}

impl EventLog {
    /// Append all events of one committed transaction.
    pub(crate) fn commit(&mut self, timestamp: DateTime<Utc>, kinds: Vec<LedgerEventKind>) {
        for kind in kinds {
            let seq = self.events.len() as u64;
            self.events.push(LedgerEvent { seq, timestamp, kind });
        }
    }

    pub(crate) fn all(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub(crate) fn since(&self, seq: u64) -> &[LedgerEvent] {
        let start = (seq as usize).min(self.events.len());
        &self.events[start..]
    }
}
