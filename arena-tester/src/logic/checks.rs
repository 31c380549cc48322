use arena_game::constants::{WIN_REWARD_COINS, WIN_REWARD_EXPERIENCE};
use arena_game::leaderboard::{self, LeaderboardEntry};
use arena_game::{ArenaError, ArenaState, BattleOutcome, BattleReward, Player, Purchase};
use serde::Serialize;
use std::fmt;

/// Invariants verified after scripted actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Check {
    ExperienceBounds,
    MaxExperienceMonotonic,
    LeaderboardOrder,
    LeaderboardIdempotent,
    AchievementsMonotonic,
    RefusalIsNoOp,
    PurchaseCharge,
    BattleReward,
    BattleTerminates,
    SingleAction,
    PersistenceRoundTrip,
}

impl Check {
    pub const ALL: [Self; 11] = [
        Self::ExperienceBounds,
        Self::MaxExperienceMonotonic,
        Self::LeaderboardOrder,
        Self::LeaderboardIdempotent,
        Self::AchievementsMonotonic,
        Self::RefusalIsNoOp,
        Self::PurchaseCharge,
        Self::BattleReward,
        Self::BattleTerminates,
        Self::SingleAction,
        Self::PersistenceRoundTrip,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::ExperienceBounds => "experience-bounds",
            Self::MaxExperienceMonotonic => "max-experience-monotonic",
            Self::LeaderboardOrder => "leaderboard-order",
            Self::LeaderboardIdempotent => "leaderboard-idempotent",
            Self::AchievementsMonotonic => "achievements-monotonic",
            Self::RefusalIsNoOp => "refusal-is-no-op",
            Self::PurchaseCharge => "purchase-charge",
            Self::BattleReward => "battle-reward",
            Self::BattleTerminates => "battle-terminates",
            Self::SingleAction => "single-action",
            Self::PersistenceRoundTrip => "persistence-round-trip",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::ExperienceBounds => "after training, experience < maxExperience for player and companion",
            Self::MaxExperienceMonotonic => "training never lowers maxExperience",
            Self::LeaderboardOrder => "ranks are 1..N in wins/strength/losses order",
            Self::LeaderboardIdempotent => "re-ranking an unchanged board changes nothing",
            Self::AchievementsMonotonic => "an unlocked achievement never locks again",
            Self::RefusalIsNoOp => "a refused purchase leaves state untouched",
            Self::PurchaseCharge => "an accepted purchase costs exactly its price",
            Self::BattleReward => "a win pays exactly 25 coins and 30 experience; a loss only counts",
            Self::BattleTerminates => "battles resolve within the turn cap",
            Self::SingleAction => "a second action is refused while one is outstanding",
            Self::PersistenceRoundTrip => "reloading storage reproduces the session state",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub check: Check,
    pub detail: String,
}

impl Violation {
    pub fn new(check: Check, detail: impl Into<String>) -> Self {
        Self {
            check,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.check.key(), self.detail)
    }
}

pub fn check_training(before: &ArenaState, after: &ArenaState, out: &mut Vec<Violation>) {
    let (player, companion) = (&after.player, &after.companion);
    if player.experience >= player.max_experience {
        out.push(Violation::new(
            Check::ExperienceBounds,
            format!(
                "player experience {} >= max {}",
                player.experience, player.max_experience
            ),
        ));
    }
    if companion.experience >= companion.max_experience {
        out.push(Violation::new(
            Check::ExperienceBounds,
            format!(
                "companion experience {} >= max {}",
                companion.experience, companion.max_experience
            ),
        ));
    }
    if player.max_experience < before.player.max_experience
        || companion.max_experience < before.companion.max_experience
    {
        out.push(Violation::new(
            Check::MaxExperienceMonotonic,
            "maxExperience decreased during training",
        ));
    }
}

pub fn check_purchase(
    before: &ArenaState,
    after: &ArenaState,
    cost: u32,
    result: &Result<Purchase, ArenaError>,
    out: &mut Vec<Violation>,
) {
    match result {
        Ok(purchase) => {
            let expected = before.player.coins.checked_sub(cost);
            if expected != Some(after.player.coins) || purchase.coins_left != after.player.coins {
                out.push(Violation::new(
                    Check::PurchaseCharge,
                    format!(
                        "coins went {} -> {} for cost {cost}",
                        before.player.coins, after.player.coins
                    ),
                ));
            }
        }
        Err(err) => {
            if before != after {
                out.push(Violation::new(
                    Check::RefusalIsNoOp,
                    format!("state changed after refusal: {err}"),
                ));
            }
            if before.player.coins >= cost {
                out.push(Violation::new(
                    Check::RefusalIsNoOp,
                    format!("affordable purchase refused: {err}"),
                ));
            }
        }
    }
}

pub fn check_battle_reward(
    before: &Player,
    after: &Player,
    reward: &BattleReward,
    out: &mut Vec<Violation>,
) {
    let expected = match reward.outcome {
        BattleOutcome::Win => (
            before.wins + 1,
            before.losses,
            before.coins + WIN_REWARD_COINS,
            before.experience + WIN_REWARD_EXPERIENCE,
        ),
        BattleOutcome::Loss => (
            before.wins,
            before.losses + 1,
            before.coins,
            before.experience,
        ),
    };
    let actual = (after.wins, after.losses, after.coins, after.experience);
    if actual != expected {
        out.push(Violation::new(
            Check::BattleReward,
            format!(
                "{:?}: expected (wins, losses, coins, exp) {expected:?}, got {actual:?}",
                reward.outcome
            ),
        ));
    }
}

/// Checks that hold after every action regardless of kind.
pub fn check_derived(before: &ArenaState, after: &ArenaState, out: &mut Vec<Violation>) {
    if !leaderboard::is_consistent(&after.leaderboard) {
        out.push(Violation::new(
            Check::LeaderboardOrder,
            "leaderboard ranks out of order",
        ));
    }
    let rerun = leaderboard::recompute(
        &after.leaderboard,
        &LeaderboardEntry::from_player(&after.player),
    );
    if rerun != after.leaderboard {
        out.push(Violation::new(
            Check::LeaderboardIdempotent,
            "re-ranking changed the board",
        ));
    }
    for earlier in before.achievements.iter().filter(|a| a.unlocked) {
        let still = after
            .achievements
            .iter()
            .any(|a| a.id == earlier.id && a.unlocked);
        if !still {
            out.push(Violation::new(
                Check::AchievementsMonotonic,
                format!("achievement {} locked again", earlier.name),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_game::UpgradeTarget;

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = Check::ALL.iter().map(|c| c.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), Check::ALL.len());
    }

    #[test]
    fn overflowing_experience_is_flagged() {
        let before = ArenaState::default();
        let mut after = before.clone();
        after.player.experience = after.player.max_experience;
        let mut out = Vec::new();
        check_training(&before, &after, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].check, Check::ExperienceBounds);
    }

    #[test]
    fn refusal_that_mutates_is_flagged() {
        let before = ArenaState::default();
        let mut after = before.clone();
        after.player.coins = 0;
        let mut out = Vec::new();
        let refused = Err(ArenaError::InsufficientCoins { cost: 500, coins: 50 });
        check_purchase(&before, &after, 500, &refused, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].check, Check::RefusalIsNoOp);
    }

    #[test]
    fn exact_charge_passes() {
        let before = ArenaState::default();
        let mut after = before.clone();
        after.player.coins = 20;
        let purchase = Ok(Purchase {
            target: UpgradeTarget::Strength,
            cost: 30,
            coins_left: 20,
        });
        let mut out = Vec::new();
        check_purchase(&before, &after, 30, &purchase, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn win_reward_must_be_exact() {
        let before = Player::default();
        let mut after = before.clone();
        after.wins += 1;
        after.coins += 25;
        after.experience += 31;
        let reward = BattleReward {
            outcome: BattleOutcome::Win,
            coins: 25,
            experience: 30,
        };
        let mut out = Vec::new();
        check_battle_reward(&before, &after, &reward, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].to_string().starts_with("[battle-reward]"));
    }

    #[test]
    fn relocked_achievement_is_flagged() {
        let mut before = ArenaState::default();
        before.achievements[1].unlocked = true;
        let after = ArenaState::default();
        let mut out = Vec::new();
        check_derived(&before, &after, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].check, Check::AchievementsMonotonic);
    }
}
