//! Achievement minter
//!
//! Mints one commemorative record per completed goal. The minting authority
//! is fixed when the minter is built; the ledger hands its own escrow account
//! in as that authority, which makes the ledger the only caller that can
//! mint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::{LedgerError, Result};
use crate::habit::HabitType;
use crate::types::AccountId;

/// A minted achievement. Immutable once minted, apart from ownership when
/// transfers are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementToken {
    pub id: u64,
    pub owner: AccountId,
    pub habit_type: HabitType,
    pub days_completed: u32,
    pub minted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct AchievementMinter {
    authority: AccountId,
    transferable: bool,
    next_id: u64,
    tokens: BTreeMap<u64, AchievementToken>,
    by_owner: HashMap<AccountId, Vec<u64>>,
}

impl AchievementMinter {
    /// Create a minter whose tokens stay with their first owner.
    pub fn new(authority: AccountId) -> Self {
        Self {
            authority,
            transferable: false,
            next_id: 0,
            tokens: BTreeMap::new(),
            by_owner: HashMap::new(),
        }
    }

    /// Allow owners to transfer their tokens.
    pub fn with_transfers(mut self) -> Self {
        self.transferable = true;
        self
    }

    pub fn authority(&self) -> &AccountId {
        &self.authority
    }

    pub fn is_transferable(&self) -> bool {
        self.transferable
    }

    /// Check that `caller` may mint, without minting.
    pub fn authorize(&self, caller: &AccountId) -> Result<()> {
        if caller != &self.authority {
            return Err(LedgerError::UnauthorizedMinter {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Id the next successful mint will receive
    pub fn next_token_id(&self) -> u64 {
        self.next_id
    }

    pub fn mint(
        &mut self,
        caller: &AccountId,
        owner: &AccountId,
        habit_type: HabitType,
        days_completed: u32,
        minted_at: DateTime<Utc>,
    ) -> Result<u64> {
        self.authorize(caller)?;
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(LedgerError::Overflow)?;

        self.tokens.insert(
            id,
            AchievementToken {
                id,
                owner: owner.clone(),
                habit_type,
                days_completed,
                minted_at,
            },
        );
        self.by_owner.entry(owner.clone()).or_default().push(id);

        debug!(token_id = id, owner = %owner, habit = %habit_type, "Achievement minted");
        Ok(id)
    }

    pub fn transfer(&mut self, caller: &AccountId, token_id: u64, to: &AccountId) -> Result<()> {
        if !self.transferable {
            return Err(LedgerError::NonTransferable);
        }
        let token = self
            .tokens
            .get_mut(&token_id)
            .ok_or(LedgerError::UnknownToken(token_id))?;
        if &token.owner != caller {
            return Err(LedgerError::NotTokenOwner {
                caller: caller.clone(),
                token_id,
            });
        }

        token.owner = to.clone();
        if let Some(ids) = self.by_owner.get_mut(caller) {
            ids.retain(|id| *id != token_id);
        }
        self.by_owner.entry(to.clone()).or_default().push(token_id);
        Ok(())
    }

    pub fn token(&self, token_id: u64) -> Option<&AchievementToken> {
        self.tokens.get(&token_id)
    }

    pub fn owner_of(&self, token_id: u64) -> Option<&AccountId> {
        self.tokens.get(&token_id).map(|t| &t.owner)
    }

    /// Token ids held by `owner`, in mint order.
    pub fn tokens_of(&self, owner: &AccountId) -> Vec<u64> {
        self.by_owner.get(owner).cloned().unwrap_or_default()
    }

    pub fn total_minted(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> AccountId {
        AccountId::new("ledger")
    }

    #[test]
    fn test_authority_mints_with_increasing_ids() {
        let mut minter = AchievementMinter::new(ledger());
        let alice = AccountId::new("alice");
        let now = Utc::now();

        let first = minter.mint(&ledger(), &alice, HabitType::Coding, 7, now).unwrap();
        let second = minter.mint(&ledger(), &alice, HabitType::Dsa, 14, now).unwrap();

        assert_eq!((first, second), (0, 1));
        assert_eq!(minter.tokens_of(&alice), vec![0, 1]);
        assert_eq!(minter.token(1).unwrap().days_completed, 14);
        assert_eq!(minter.token(1).unwrap().habit_type, HabitType::Dsa);
        assert_eq!(minter.total_minted(), 2);
    }

    #[test]
    fn test_other_callers_cannot_mint() {
        let mut minter = AchievementMinter::new(ledger());
        let alice = AccountId::new("alice");

        let err = minter
            .mint(&alice, &alice, HabitType::Gym, 3, Utc::now())
            .unwrap_err();
        assert_eq!(err, LedgerError::UnauthorizedMinter { caller: alice.clone() });
        assert_eq!(minter.total_minted(), 0);
        assert!(minter.tokens_of(&alice).is_empty());
    }

    #[test]
    fn test_tokens_are_soulbound_by_default() {
        let mut minter = AchievementMinter::new(ledger());
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        let id = minter.mint(&ledger(), &alice, HabitType::Yoga, 21, Utc::now()).unwrap();

        assert_eq!(minter.transfer(&alice, id, &bob), Err(LedgerError::NonTransferable));
        assert_eq!(minter.owner_of(id), Some(&alice));
    }

    #[test]
    fn test_transfer_when_enabled() {
        let mut minter = AchievementMinter::new(ledger()).with_transfers();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        let id = minter.mint(&ledger(), &alice, HabitType::Running, 10, Utc::now()).unwrap();

        assert!(matches!(
            minter.transfer(&bob, id, &bob),
            Err(LedgerError::NotTokenOwner { .. })
        ));
        minter.transfer(&alice, id, &bob).unwrap();
        assert_eq!(minter.owner_of(id), Some(&bob));
        assert!(minter.tokens_of(&alice).is_empty());
        assert_eq!(minter.tokens_of(&bob), vec![id]);
    }
}
