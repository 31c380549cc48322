//! Turn-based battle simulation.
//!
//! The simulation is a pure step function over [`BattleState`]. Real-time
//! pacing belongs to the caller: the browser layer invokes one step per timer
//! tick, while tests and the tester loop synchronously.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMBATANT_START_HEALTH, COMPANION_ASSIST_FACTOR, CRITICAL_MULTIPLIER, CRITICAL_THRESHOLD,
    MISS_THRESHOLD, OPPONENT_VARIANCE_BASE, OPPONENT_VARIANCE_SPAN, WIN_REWARD_COINS,
    WIN_REWARD_EXPERIENCE,
};
use crate::leaderboard::{LeaderboardEntry, opponents};
use crate::numbers::{floor_f64_to_u32, u32_to_f64};
use crate::player::{Companion, Player};

/// Tag describing how a single attack landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Hit,
    Critical,
    /// The player's attack whiffed.
    Miss,
    /// The opponent's attack was defended by the player.
    Defend,
}

/// Which side acts on a given turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    /// Odd turns belong to the player, even turns to the opponent.
    #[must_use]
    pub const fn for_turn(turn: u32) -> Self {
        if turn % 2 == 1 {
            Self::Player
        } else {
            Self::Opponent
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Win,
    Loss,
}

/// Lifecycle of the battle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "outcome")]
pub enum BattlePhase {
    Idle,
    SelectingOpponent,
    Running,
    Resolved(BattleOutcome),
}

/// One line of the transient battle log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLogEntry {
    pub turn: u32,
    pub kind: AttackKind,
    pub attacker: String,
    pub defender: String,
    pub damage: u32,
    /// Defender health after the attack.
    pub defender_health: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub level: u32,
    pub strength: u32,
    pub health: u32,
}

/// Uniform `[0, 1)` draws consumed by a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnDraws {
    /// Miss check; at or below the miss threshold the attack misses.
    pub accuracy: f64,
    /// Critical check for the player, damage variance for the opponent.
    pub power: f64,
}

impl TurnDraws {
    #[must_use]
    pub const fn new(accuracy: f64, power: f64) -> Self {
        Self { accuracy, power }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            accuracy: rng.r#gen::<f64>(),
            power: rng.r#gen::<f64>(),
        }
    }
}

/// Full state of an in-progress or resolved battle.
///
/// Combatant stats are captured when the battle starts; upgrades bought
/// mid-fight apply from the next battle onward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub phase: BattlePhase,
    /// Number of turns already played.
    pub turn: u32,
    pub player: Combatant,
    pub companion_power: u32,
    pub opponent: Combatant,
    pub log: Vec<BattleLogEntry>,
}

impl BattleState {
    /// Begin a battle with both sides at full health.
    #[must_use]
    pub fn new(player: &Player, companion: &Companion, opponent: &LeaderboardEntry) -> Self {
        Self {
            phase: BattlePhase::Running,
            turn: 0,
            player: Combatant {
                name: player.nickname.clone(),
                level: player.level,
                strength: player.strength,
                health: COMBATANT_START_HEALTH,
            },
            companion_power: companion.power,
            opponent: Combatant {
                name: opponent.nickname.clone(),
                level: opponent.level,
                strength: opponent.strength,
                health: COMBATANT_START_HEALTH,
            },
            log: Vec::new(),
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, BattlePhase::Running)
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Side that acts on the next turn.
    #[must_use]
    pub const fn next_side(&self) -> Side {
        Side::for_turn(self.turn.saturating_add(1))
    }
}

/// Resolve a player-side attack (player plus companion).
#[must_use]
pub fn player_attack(strength: u32, companion_power: u32, draws: TurnDraws) -> (AttackKind, u32) {
    if draws.accuracy <= MISS_THRESHOLD {
        return (AttackKind::Miss, 0);
    }
    let strength = u32_to_f64(strength);
    let power = u32_to_f64(companion_power);
    if draws.power > CRITICAL_THRESHOLD {
        (
            AttackKind::Critical,
            floor_f64_to_u32((strength + power) * CRITICAL_MULTIPLIER),
        )
    } else {
        (
            AttackKind::Hit,
            floor_f64_to_u32(strength + power * COMPANION_ASSIST_FACTOR),
        )
    }
}

/// Resolve an opponent attack with 80%..120% damage variance.
#[must_use]
pub fn opponent_attack(strength: u32, draws: TurnDraws) -> (AttackKind, u32) {
    if draws.accuracy <= MISS_THRESHOLD {
        return (AttackKind::Defend, 0);
    }
    let variance = OPPONENT_VARIANCE_BASE + draws.power * OPPONENT_VARIANCE_SPAN;
    (
        AttackKind::Hit,
        floor_f64_to_u32(u32_to_f64(strength) * variance),
    )
}

/// Play one turn and return the next state.
///
/// Resolution checks opponent health before player health, so a battle that
/// somehow reaches double zero counts as a win. A resolved battle is returned
/// unchanged.
#[must_use]
pub fn advance_turn(state: &BattleState, draws: TurnDraws) -> BattleState {
    let mut next = state.clone();
    if !state.is_running() {
        return next;
    }
    next.turn = state.turn.saturating_add(1);
    let entry = match Side::for_turn(next.turn) {
        Side::Player => {
            let (kind, damage) = player_attack(next.player.strength, next.companion_power, draws);
            next.opponent.health = next.opponent.health.saturating_sub(damage);
            BattleLogEntry {
                turn: next.turn,
                kind,
                attacker: next.player.name.clone(),
                defender: next.opponent.name.clone(),
                damage,
                defender_health: next.opponent.health,
            }
        }
        Side::Opponent => {
            let (kind, damage) = opponent_attack(next.opponent.strength, draws);
            next.player.health = next.player.health.saturating_sub(damage);
            BattleLogEntry {
                turn: next.turn,
                kind,
                attacker: next.opponent.name.clone(),
                defender: next.player.name.clone(),
                damage,
                defender_health: next.player.health,
            }
        }
    };
    next.log.push(entry);

    if next.opponent.health == 0 {
        next.phase = BattlePhase::Resolved(BattleOutcome::Win);
    } else if next.player.health == 0 {
        next.phase = BattlePhase::Resolved(BattleOutcome::Loss);
    }
    next
}

/// Pick a uniformly random opponent other than the player.
///
/// Returns `None` when nobody else is on the board.
pub fn select_opponent<R: Rng + ?Sized>(
    entries: &[LeaderboardEntry],
    player_nickname: &str,
    rng: &mut R,
) -> Option<LeaderboardEntry> {
    let pool = opponents(entries, player_nickname);
    if pool.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..pool.len());
    pool.get(idx).map(|entry| (*entry).clone())
}

/// Reward or penalty applied to the player once a battle resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleReward {
    pub outcome: BattleOutcome,
    pub coins: u32,
    pub experience: u32,
}

/// Apply the result of a battle to the player record.
///
/// Win experience is added directly; it does not trigger a level-up.
pub fn apply_battle_result(player: &mut Player, outcome: BattleOutcome) -> BattleReward {
    match outcome {
        BattleOutcome::Win => {
            player.wins = player.wins.saturating_add(1);
            player.coins = player.coins.saturating_add(WIN_REWARD_COINS);
            player.experience = player.experience.saturating_add(WIN_REWARD_EXPERIENCE);
            BattleReward {
                outcome,
                coins: WIN_REWARD_COINS,
                experience: WIN_REWARD_EXPERIENCE,
            }
        }
        BattleOutcome::Loss => {
            player.losses = player.losses.saturating_add(1);
            BattleReward {
                outcome,
                coins: 0,
                experience: 0,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn fresh_battle(strength: u32, power: u32, opponent_strength: u32) -> BattleState {
        let player = Player {
            strength,
            ..Player::default()
        };
        let companion = Companion {
            power,
            ..Companion::default()
        };
        let opponent = LeaderboardEntry::new("Target", 3, opponent_strength, 0, 0);
        BattleState::new(&player, &companion, &opponent)
    }

    #[test]
    fn player_attack_resolution_table() {
        assert_eq!(player_attack(20, 10, TurnDraws::new(0.2, 0.99)), (AttackKind::Miss, 0));
        assert_eq!(player_attack(20, 10, TurnDraws::new(0.5, 0.86)), (AttackKind::Critical, 45));
        assert_eq!(player_attack(20, 10, TurnDraws::new(0.5, 0.85)), (AttackKind::Hit, 25));
        assert_eq!(player_attack(20, 5, TurnDraws::new(0.9, 0.1)), (AttackKind::Hit, 22));
    }

    #[test]
    fn opponent_attack_scales_with_variance() {
        assert_eq!(opponent_attack(50, TurnDraws::new(0.1, 0.5)), (AttackKind::Defend, 0));
        assert_eq!(opponent_attack(50, TurnDraws::new(0.5, 0.0)), (AttackKind::Hit, 40));
        assert_eq!(opponent_attack(50, TurnDraws::new(0.5, 0.5)), (AttackKind::Hit, 50));
        let (_, max_hit) = opponent_attack(50, TurnDraws::new(0.5, 0.999_999));
        assert!(max_hit < 60);
    }

    #[test]
    fn turns_alternate_starting_with_player() {
        let state = fresh_battle(10, 5, 10);
        let hit = TurnDraws::new(0.5, 0.5);
        let first = advance_turn(&state, hit);
        assert_eq!(first.turn, 1);
        assert_eq!(first.log[0].attacker, "Champion");
        assert_eq!(first.opponent.health, 88);
        let second = advance_turn(&first, hit);
        assert_eq!(second.log[1].attacker, "Target");
        assert_eq!(second.player.health, 90);
        assert_eq!(second.next_side(), Side::Player);
    }

    #[test]
    fn health_floors_at_zero_and_resolves_win() {
        let state = fresh_battle(200, 0, 10);
        let next = advance_turn(&state, TurnDraws::new(0.9, 0.1));
        assert_eq!(next.opponent.health, 0);
        assert_eq!(next.outcome(), Some(BattleOutcome::Win));
        let after = advance_turn(&next, TurnDraws::new(0.9, 0.1));
        assert_eq!(after, next);
    }

    #[test]
    fn opponent_can_win() {
        let mut state = fresh_battle(1, 1, 500);
        state.turn = 1;
        let next = advance_turn(&state, TurnDraws::new(0.9, 0.5));
        assert_eq!(next.player.health, 0);
        assert_eq!(next.outcome(), Some(BattleOutcome::Loss));
    }

    #[test]
    fn simultaneous_zero_prefers_win() {
        let mut state = fresh_battle(10, 0, 10);
        state.player.health = 0;
        let next = advance_turn(&state, TurnDraws::new(0.9, 0.1));
        assert!(next.opponent.health > 0);
        assert_eq!(next.outcome(), Some(BattleOutcome::Loss));

        let mut state = fresh_battle(500, 0, 10);
        state.player.health = 0;
        let next = advance_turn(&state, TurnDraws::new(0.9, 0.1));
        assert_eq!(next.outcome(), Some(BattleOutcome::Win));
    }

    #[test]
    fn seeded_battles_terminate() {
        let mut rng = SmallRng::seed_from_u64(2024);
        for _ in 0..200 {
            let mut state = fresh_battle(10, 5, 96);
            let mut guard = 0;
            while state.is_running() {
                state = advance_turn(&state, TurnDraws::draw(&mut rng));
                guard += 1;
                assert!(guard < 10_000, "battle failed to terminate");
            }
            assert_eq!(state.log.len(), usize::try_from(state.turn).unwrap());
        }
    }

    #[test]
    fn win_reward_ignores_level_threshold() {
        let mut player = Player {
            experience: 90,
            ..Player::default()
        };
        let reward = apply_battle_result(&mut player, BattleOutcome::Win);
        assert_eq!(player.wins, 1);
        assert_eq!(player.coins, 75);
        assert_eq!(player.experience, 120);
        assert_eq!(player.level, 1);
        assert_eq!(reward.coins, 25);

        apply_battle_result(&mut player, BattleOutcome::Loss);
        assert_eq!(player.losses, 1);
        assert_eq!(player.coins, 75);
    }

    #[test]
    fn selection_excludes_player_and_handles_empty_pool() {
        let mut rng = SmallRng::seed_from_u64(3);
        let only_me = vec![LeaderboardEntry::new("Champion", 1, 10, 0, 0)];
        assert!(select_opponent(&only_me, "Champion", &mut rng).is_none());
        assert!(select_opponent(&[], "Champion", &mut rng).is_none());

        let board = crate::leaderboard::recompute(
            &crate::leaderboard::seed_entries(),
            &only_me[0],
        );
        for _ in 0..100 {
            let picked = select_opponent(&board, "Champion", &mut rng).unwrap();
            assert_ne!(picked.nickname, "Champion");
        }
    }
}
