//! Goal ledger
//!
//! The escrow authority for staked goals. Every mutating call takes a
//! [`TxContext`] and is all-or-nothing: it validates and computes every new
//! value first, and only then writes. A rejected call leaves balances,
//! goals, stakes, tokens and events exactly as they were.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::error::{InvalidParameter, LedgerError, Result};
use crate::events::{EventLog, LedgerEvent, LedgerEventKind};
use crate::habit::HabitType;
use crate::minter::AchievementMinter;
use crate::types::{
    completion_bonus, amount_string, AccountId, CheckInOutcome, Goal, GoalRef, TokenAmount,
    TxContext, MAX_LIVES, ONE_TOKEN,
};

/// Deployment parameters of a ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Account credited with the initial supply
    pub treasury: AccountId,
    /// Account holding escrowed stakes; also the minter authority
    pub escrow: AccountId,
    pub initial_supply: TokenAmount,
    /// One-time starter grant for onboarding accounts
    pub onboarding_grant: TokenAmount,
    /// Let achievement owners transfer their tokens
    pub transferable_achievements: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            treasury: AccountId::new("treasury"),
            escrow: AccountId::new("goalforge-escrow"),
            initial_supply: 1_000_000 * ONE_TOKEN,
            onboarding_grant: 100 * ONE_TOKEN,
            transferable_achievements: false,
        }
    }
}

/// Read-only view of one account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub account: AccountId,
    #[serde(with = "amount_string")]
    pub balance: TokenAmount,
    #[serde(with = "amount_string")]
    pub staked: TokenAmount,
    pub onboarded: bool,
    pub goals: usize,
    pub achievements: Vec<u64>,
}

#[derive(Debug)]
pub struct GoalLedger {
    config: LedgerConfig,
    balances: HashMap<AccountId, TokenAmount>,
    total_supply: TokenAmount,
    goals: HashMap<AccountId, Vec<Goal>>,
    creation_order: Vec<GoalRef>,
    user_stakes: HashMap<AccountId, TokenAmount>,
    onboarded: HashSet<AccountId>,
    minter: AchievementMinter,
    events: EventLog,
}

impl GoalLedger {
    pub fn new(config: LedgerConfig) -> Self {
        let mut minter = AchievementMinter::new(config.escrow.clone());
        if config.transferable_achievements {
            minter = minter.with_transfers();
        }

        let mut balances = HashMap::new();
        if config.initial_supply > 0 {
            balances.insert(config.treasury.clone(), config.initial_supply);
        }

        info!(
            treasury = %config.treasury,
            escrow = %config.escrow,
            supply = %config.initial_supply,
            "Ledger deployed"
        );

        Self {
            total_supply: config.initial_supply,
            config,
            balances,
            goals: HashMap::new(),
            creation_order: Vec::new(),
            user_stakes: HashMap::new(),
            onboarded: HashSet::new(),
            minter,
            events: EventLog::default(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Grant the starter tokens, once per account.
    pub fn onboard(&mut self, ctx: &TxContext) -> Result<TokenAmount> {
        self.ensure_user(ctx)?;
        let user = &ctx.caller;
        if self.onboarded.contains(user) {
            return Err(LedgerError::AlreadyOnboarded);
        }

        let grant = self.config.onboarding_grant;
        let balance = self
            .balance_of(user)
            .checked_add(grant)
            .ok_or(LedgerError::Overflow)?;
        let supply = self
            .total_supply
            .checked_add(grant)
            .ok_or(LedgerError::Overflow)?;

        self.onboarded.insert(user.clone());
        self.balances.insert(user.clone(), balance);
        self.total_supply = supply;
        self.events.commit(
            ctx.timestamp,
            vec![LedgerEventKind::UserOnboarded { user: user.clone() }],
        );

        info!(user = %user, grant = %grant, "User onboarded");
        Ok(grant)
    }

    /// Stake tokens on a new goal. Returns the goal's index in the caller's list.
    pub fn create_habit(
        &mut self,
        ctx: &TxContext,
        habit_type: u8,
        total_days: u32,
        lives: u8,
        stake: TokenAmount,
        verification_handle: impl Into<String>,
    ) -> Result<usize> {
        self.ensure_user(ctx)?;
        let user = &ctx.caller;
        let habit = HabitType::from_code(habit_type)
            .ok_or(InvalidParameter::UnknownHabit(habit_type))?;
        if total_days == 0 {
            return Err(InvalidParameter::ZeroDays.into());
        }
        if lives > MAX_LIVES {
            return Err(InvalidParameter::TooManyLives.into());
        }
        if stake == 0 {
            return Err(InvalidParameter::ZeroStake.into());
        }

        let available = self.balance_of(user);
        if available < stake {
            return Err(LedgerError::InsufficientBalance {
                needed: stake,
                available,
            });
        }

        let escrow = &self.config.escrow;
        let caller_balance = available - stake;
        let escrow_balance = self
            .balance_of(escrow)
            .checked_add(stake)
            .ok_or(LedgerError::Overflow)?;
        let staked = self
            .user_stakes(user)
            .checked_add(stake)
            .ok_or(LedgerError::Overflow)?;

        let goal = Goal::open(
            user.clone(),
            habit,
            total_days,
            lives,
            stake,
            verification_handle.into(),
            ctx.timestamp,
        );
        let title = goal.title.clone();

        let goals = self.goals.entry(user.clone()).or_default();
        let index = goals.len();
        goals.push(goal);
        self.creation_order.push(GoalRef {
            owner: user.clone(),
            index,
        });
        self.balances.insert(user.clone(), caller_balance);
        self.balances.insert(escrow.clone(), escrow_balance);
        self.user_stakes.insert(user.clone(), staked);
        self.events.commit(
            ctx.timestamp,
            vec![LedgerEventKind::GoalCreated {
                user: user.clone(),
                goal_index: index,
                title,
                stake,
                habit_type: habit,
            }],
        );

        info!(
            user = %user,
            goal_index = index,
            habit = %habit,
            total_days,
            lives,
            stake = %stake,
            "Goal created"
        );
        Ok(index)
    }

    /// Record one day's verdict against the caller's goal.
    pub fn check_in(
        &mut self,
        ctx: &TxContext,
        goal_index: usize,
        success: bool,
    ) -> Result<CheckInOutcome> {
        self.ensure_user(ctx)?;
        let user = ctx.caller.clone();
        let goal = self
            .goals
            .get(&user)
            .and_then(|goals| goals.get(goal_index))
            .ok_or_else(|| LedgerError::InvalidGoalIndex {
                owner: user.clone(),
                index: goal_index,
            })?;
        if goal.is_terminal() {
            return Err(LedgerError::GoalFinalized {
                owner: user,
                index: goal_index,
            });
        }

        if success {
            let progress = goal.progress + 1;
            let streak = goal.current_streak.checked_add(1).ok_or(LedgerError::Overflow)?;
            if progress >= goal.total_days {
                self.complete_goal(ctx, goal_index, progress, streak)
            } else {
                self.with_goal(&user, goal_index, |g| {
                    g.progress = progress;
                    g.current_streak = streak;
                });
                self.events.commit(
                    ctx.timestamp,
                    vec![LedgerEventKind::GoalProgress {
                        user: user.clone(),
                        goal_index,
                        progress,
                    }],
                );
                debug!(user = %user, goal_index, progress, streak, "Goal progressed");
                Ok(CheckInOutcome::Progressed { progress, streak })
            }
        } else if goal.lives_left > 0 {
            let lives_left = goal.lives_left - 1;
            self.with_goal(&user, goal_index, |g| g.lives_left = lives_left);
            self.events.commit(
                ctx.timestamp,
                vec![LedgerEventKind::LifeLost {
                    user: user.clone(),
                    goal_index,
                    lives_left,
                }],
            );
            info!(user = %user, goal_index, lives_left, "Life lost");
            Ok(CheckInOutcome::LifeLost { lives_left })
        } else {
            self.fail_goal(ctx, goal_index)
        }
    }

    /// Plain token transfer between accounts.
    pub fn transfer(&mut self, ctx: &TxContext, to: &AccountId, amount: TokenAmount) -> Result<()> {
        self.ensure_user(ctx)?;
        let from = &ctx.caller;
        let available = self.balance_of(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        if from != to {
            let credited = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            self.balances.insert(from.clone(), available - amount);
            self.balances.insert(to.clone(), credited);
        }
        self.events.commit(
            ctx.timestamp,
            vec![LedgerEventKind::Transfer {
                from: from.clone(),
                to: to.clone(),
                amount,
            }],
        );

        debug!(from = %from, to = %to, amount = %amount, "Transfer");
        Ok(())
    }

    fn complete_goal(
        &mut self,
        ctx: &TxContext,
        goal_index: usize,
        progress: u32,
        streak: u32,
    ) -> Result<CheckInOutcome> {
        let user = &ctx.caller;
        let escrow = self.config.escrow.clone();
        let (stake, habit, total_days) = self
            .goal_fields(user, goal_index)
            .ok_or_else(|| LedgerError::InvalidGoalIndex {
                owner: user.clone(),
                index: goal_index,
            })?;

        let bonus = completion_bonus(stake);
        let payout = stake.checked_add(bonus).ok_or(LedgerError::Overflow)?;
        let escrow_after = self
            .balance_of(&escrow)
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;
        let caller_after = self
            .balance_of(user)
            .checked_add(payout)
            .ok_or(LedgerError::Overflow)?;
        let supply_after = self
            .total_supply
            .checked_add(bonus)
            .ok_or(LedgerError::Overflow)?;
        let staked_after = self
            .user_stakes(user)
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;

        // Last fallible step; everything after it is plain assignment.
        let token_id = self
            .minter
            .mint(&escrow, user, habit, total_days, ctx.timestamp)?;

        self.with_goal(user, goal_index, |g| {
            g.progress = progress;
            g.current_streak = streak;
            g.completed = true;
            g.verified = true;
        });
        self.balances.insert(escrow, escrow_after);
        self.balances.insert(user.clone(), caller_after);
        self.total_supply = supply_after;
        self.set_stake(user, staked_after);
        self.events.commit(
            ctx.timestamp,
            vec![
                LedgerEventKind::GoalProgress {
                    user: user.clone(),
                    goal_index,
                    progress,
                },
                LedgerEventKind::GoalCompleted {
                    user: user.clone(),
                    goal_index,
                    stake,
                    bonus,
                },
                LedgerEventKind::AchievementMinted {
                    owner: user.clone(),
                    token_id,
                    habit_type: habit,
                },
            ],
        );

        info!(
            user = %user,
            goal_index,
            payout = %payout,
            bonus = %bonus,
            token_id,
            "Goal completed"
        );
        Ok(CheckInOutcome::Completed {
            payout,
            bonus,
            token_id,
        })
    }

    fn fail_goal(&mut self, ctx: &TxContext, goal_index: usize) -> Result<CheckInOutcome> {
        let user = &ctx.caller;
        let escrow = self.config.escrow.clone();
        let (stake, _, _) = self
            .goal_fields(user, goal_index)
            .ok_or_else(|| LedgerError::InvalidGoalIndex {
                owner: user.clone(),
                index: goal_index,
            })?;

        let escrow_after = self
            .balance_of(&escrow)
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;
        let supply_after = self
            .total_supply
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;
        let staked_after = self
            .user_stakes(user)
            .checked_sub(stake)
            .ok_or(LedgerError::Overflow)?;

        self.with_goal(user, goal_index, |g| {
            g.completed = false;
            g.verified = true;
        });
        self.balances.insert(escrow, escrow_after);
        self.total_supply = supply_after;
        self.set_stake(user, staked_after);
        self.events.commit(
            ctx.timestamp,
            vec![LedgerEventKind::GoalFailed {
                user: user.clone(),
                goal_index,
                stake,
            }],
        );

        info!(user = %user, goal_index, burned = %stake, "Goal failed, stake burned");
        Ok(CheckInOutcome::Failed { burned: stake })
    }

    /// The escrow account belongs to the ledger and never signs transactions.
    fn ensure_user(&self, ctx: &TxContext) -> Result<()> {
        if ctx.caller == self.config.escrow {
            return Err(LedgerError::ReservedAccount {
                account: ctx.caller.clone(),
            });
        }
        Ok(())
    }

    fn goal_fields(&self, user: &AccountId, index: usize) -> Option<(TokenAmount, HabitType, u32)> {
        self.goals
            .get(user)
            .and_then(|goals| goals.get(index))
            .map(|g| (g.stake, g.habit_type, g.total_days))
    }

    fn with_goal(&mut self, user: &AccountId, index: usize, apply: impl FnOnce(&mut Goal)) {
        if let Some(goal) = self.goals.get_mut(user).and_then(|goals| goals.get_mut(index)) {
            apply(goal);
        }
    }

    fn set_stake(&mut self, user: &AccountId, amount: TokenAmount) {
        if amount == 0 {
            self.user_stakes.remove(user);
        } else {
            self.user_stakes.insert(user.clone(), amount);
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn user_goals(&self, user: &AccountId) -> &[Goal] {
        self.goals.get(user).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn goal(&self, goal: &GoalRef) -> Option<&Goal> {
        self.goals.get(&goal.owner).and_then(|goals| goals.get(goal.index))
    }

    /// Every goal of every user, in creation order. Linear in the total
    /// number of goals; prefer [`GoalLedger::all_goals_page`].
    pub fn all_goals(&self) -> Vec<(&AccountId, &Goal)> {
        self.all_goals_page(0, self.creation_order.len())
    }

    pub fn all_goals_page(&self, offset: usize, limit: usize) -> Vec<(&AccountId, &Goal)> {
        self.creation_order
            .iter()
            .skip(offset)
            .take(limit)
            .filter_map(|r| self.goal(r).map(|g| (&r.owner, g)))
            .collect()
    }

    pub fn goal_count(&self) -> usize {
        self.creation_order.len()
    }

    /// Achievement token ids held by `user`
    pub fn user_achievements(&self, user: &AccountId) -> Vec<u64> {
        self.minter.tokens_of(user)
    }

    pub fn balance_of(&self, account: &AccountId) -> TokenAmount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Aggregate stake escrowed across the user's active goals
    pub fn user_stakes(&self, user: &AccountId) -> TokenAmount {
        self.user_stakes.get(user).copied().unwrap_or(0)
    }

    pub fn has_onboarded(&self, user: &AccountId) -> bool {
        self.onboarded.contains(user)
    }

    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    pub fn escrow_balance(&self) -> TokenAmount {
        self.balance_of(&self.config.escrow)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.events.all()
    }

    pub fn events_since(&self, seq: u64) -> &[LedgerEvent] {
        self.events.since(seq)
    }

    pub fn minter(&self) -> &AchievementMinter {
        &self.minter
    }

    pub fn account(&self, account: &AccountId) -> AccountSnapshot {
        AccountSnapshot {
            account: account.clone(),
            balance: self.balance_of(account),
            staked: self.user_stakes(account),
            onboarded: self.has_onboarded(account),
            goals: self.user_goals(account).len(),
            achievements: self.user_achievements(account),
        }
    }
}

impl Default for GoalLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GoalStatus;

    fn alice() -> TxContext {
        TxContext::new("alice")
    }

    fn funded() -> GoalLedger {
        let mut ledger = GoalLedger::default();
        ledger.onboard(&alice()).unwrap();
        ledger
    }

    #[test]
    fn test_deploy_credits_treasury() {
        let ledger = GoalLedger::default();
        assert_eq!(ledger.balance_of(&"treasury".into()), 1_000_000 * ONE_TOKEN);
        assert_eq!(ledger.total_supply(), 1_000_000 * ONE_TOKEN);
        assert_eq!(ledger.minter().authority(), &ledger.config().escrow);
    }

    #[test]
    fn test_onboard_once() {
        let mut ledger = funded();
        assert_eq!(ledger.balance_of(&"alice".into()), 100 * ONE_TOKEN);
        assert_eq!(ledger.onboard(&alice()), Err(LedgerError::AlreadyOnboarded));
        assert_eq!(ledger.balance_of(&"alice".into()), 100 * ONE_TOKEN);
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn test_create_habit_validation_order() {
        let mut ledger = funded();
        let ctx = alice();
        assert_eq!(
            ledger.create_habit(&ctx, 7, 3, 1, 10, "a"),
            Err(LedgerError::InvalidParameters(InvalidParameter::UnknownHabit(7)))
        );
        assert_eq!(
            ledger.create_habit(&ctx, 0, 0, 1, 10, "a"),
            Err(LedgerError::InvalidParameters(InvalidParameter::ZeroDays))
        );
        assert_eq!(
            ledger.create_habit(&ctx, 0, 3, 6, 10, "a"),
            Err(LedgerError::InvalidParameters(InvalidParameter::TooManyLives))
        );
        assert_eq!(
            ledger.create_habit(&ctx, 0, 3, 1, 0, "a"),
            Err(LedgerError::InvalidParameters(InvalidParameter::ZeroStake))
        );
        assert!(matches!(
            ledger.create_habit(&ctx, 0, 3, 1, 101 * ONE_TOKEN, "a"),
            Err(LedgerError::InsufficientBalance { .. })
        ));
        assert!(ledger.user_goals(&ctx.caller).is_empty());
        assert_eq!(ledger.events().len(), 1);
    }

    #[test]
    fn test_miss_keeps_streak_and_spends_life() {
        let mut ledger = funded();
        let ctx = alice();
        let idx = ledger.create_habit(&ctx, 3, 5, 1, ONE_TOKEN, "").unwrap();

        ledger.check_in(&ctx, idx, true).unwrap();
        let outcome = ledger.check_in(&ctx, idx, false).unwrap();
        assert_eq!(outcome, CheckInOutcome::LifeLost { lives_left: 0 });

        let goal = &ledger.user_goals(&ctx.caller)[idx];
        assert_eq!(goal.current_streak, 1);
        assert_eq!(goal.progress, 1);
        assert_eq!(goal.status(), GoalStatus::Active);
    }

    #[test]
    fn test_terminal_goal_rejects_check_in() {
        let mut ledger = funded();
        let ctx = alice();
        let idx = ledger.create_habit(&ctx, 0, 7, 0, ONE_TOKEN, "octocat").unwrap();
        ledger.check_in(&ctx, idx, false).unwrap();

        let before = ledger.user_goals(&ctx.caller)[idx].clone();
        let events = ledger.events().len();
        assert_eq!(
            ledger.check_in(&ctx, idx, true),
            Err(LedgerError::GoalFinalized {
                owner: ctx.caller.clone(),
                index: idx
            })
        );
        assert_eq!(ledger.user_goals(&ctx.caller)[idx], before);
        assert_eq!(ledger.events().len(), events);
    }

    #[test]
    fn test_goal_index_is_per_user() {
        let mut ledger = funded();
        let bob = TxContext::new("bob");
        ledger.onboard(&bob).unwrap();
        ledger.create_habit(&alice(), 0, 3, 0, ONE_TOKEN, "").unwrap();

        assert!(matches!(
            ledger.check_in(&bob, 0, true),
            Err(LedgerError::InvalidGoalIndex { .. })
        ));
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = funded();
        let bob: AccountId = "bob".into();
        ledger.transfer(&alice(), &bob, 40 * ONE_TOKEN).unwrap();
        assert_eq!(ledger.balance_of(&bob), 40 * ONE_TOKEN);
        assert_eq!(ledger.balance_of(&"alice".into()), 60 * ONE_TOKEN);
        assert!(matches!(
            ledger.transfer(&alice(), &bob, 61 * ONE_TOKEN),
            Err(LedgerError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_pagination() {
        let mut ledger = funded();
        let ctx = alice();
        for _ in 0..5 {
            ledger.create_habit(&ctx, 1, 2, 0, ONE_TOKEN, "").unwrap();
        }
        assert_eq!(ledger.all_goals().len(), 5);
        assert_eq!(ledger.all_goals_page(3, 10).len(), 2);
        assert!(ledger.all_goals_page(9, 10).is_empty());
    }
}
