//! Session state, change tracking and read-only snapshots.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::achievements::{self, Achievement, AchievementKind};
use crate::battle::{BattleLogEntry, BattlePhase, BattleState};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::player::{Companion, Player};

/// The four persisted domains owned by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaState {
    pub player: Player,
    pub companion: Companion,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub achievements: Vec<Achievement>,
}

impl Default for ArenaState {
    fn default() -> Self {
        Self::from_parts(
            Player::default(),
            Companion::default(),
            leaderboard::seed_entries(),
            achievements::default_achievements(),
        )
    }
}

impl ArenaState {
    /// Assemble a state from independently loaded parts and repair derived data.
    ///
    /// The board keeps only built-in opponents and the player's own row.
    /// Rows left behind by an older player record are dropped, duplicate
    /// nicknames keep their first row, the player's row is upserted and ranks
    /// are recomputed. Achievements are reconciled with the catalog and
    /// re-evaluated.
    #[must_use]
    pub fn from_parts(
        player: Player,
        companion: Companion,
        leaderboard: Vec<LeaderboardEntry>,
        achievements: Vec<Achievement>,
    ) -> Self {
        let opponents: HashSet<String> = leaderboard::seed_entries()
            .into_iter()
            .map(|entry| entry.nickname)
            .collect();
        let mut seen = HashSet::new();
        let board: Vec<LeaderboardEntry> = leaderboard
            .into_iter()
            .filter(|entry| {
                opponents.contains(&entry.nickname) || entry.nickname == player.nickname
            })
            .filter(|entry| seen.insert(entry.nickname.clone()))
            .collect();
        let board = leaderboard::recompute(&board, &LeaderboardEntry::from_player(&player));
        let mut achievements = achievements::reconcile(&achievements);
        achievements::evaluate(&mut achievements, &player, &companion);
        Self {
            player,
            companion,
            leaderboard: board,
            achievements,
        }
    }

    /// Re-rank the board from the player's current standing.
    ///
    /// Returns true when the board changed.
    pub fn refresh_leaderboard(&mut self) -> bool {
        let next =
            leaderboard::recompute(&self.leaderboard, &LeaderboardEntry::from_player(&self.player));
        if next == self.leaderboard {
            return false;
        }
        self.leaderboard = next;
        true
    }

    /// Unlock achievements earned by the current state.
    pub fn refresh_achievements(&mut self) -> Vec<AchievementKind> {
        achievements::evaluate(&mut self.achievements, &self.player, &self.companion)
    }

    #[must_use]
    pub fn player_rank(&self) -> Option<u32> {
        leaderboard::rank_of(&self.leaderboard, &self.player.nickname)
    }
}

/// Which persisted domains a commit touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub player: bool,
    pub companion: bool,
    pub leaderboard: bool,
    pub achievements: bool,
}

impl ChangeSet {
    pub const NONE: Self = Self {
        player: false,
        companion: false,
        leaderboard: false,
        achievements: false,
    };

    pub const ALL: Self = Self {
        player: true,
        companion: true,
        leaderboard: true,
        achievements: true,
    };

    #[must_use]
    pub const fn player() -> Self {
        Self {
            player: true,
            ..Self::NONE
        }
    }

    #[must_use]
    pub const fn player_and_companion() -> Self {
        Self {
            player: true,
            companion: true,
            ..Self::NONE
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.player || self.companion || self.leaderboard || self.achievements)
    }
}

/// What the session is currently doing. Only one action may be outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    Training,
    Battle,
}

/// Owned, read-only copy of everything a view needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaSnapshot {
    pub player: Player,
    pub companion: CompanionView,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub achievements: Vec<Achievement>,
    pub unlocked_achievements: usize,
    pub player_rank: Option<u32>,
    pub activity: Activity,
    /// Set while an action is outstanding and new ones will be refused.
    pub busy: bool,
    pub battle_phase: BattlePhase,
    pub battle: Option<BattleState>,
}

impl ArenaSnapshot {
    #[must_use]
    pub fn capture(state: &ArenaState, activity: Activity, battle: Option<&BattleState>) -> Self {
        let battle_phase = battle.map_or(BattlePhase::Idle, |b| b.phase);
        Self {
            player: state.player.clone(),
            companion: CompanionView::from(&state.companion),
            leaderboard: state.leaderboard.clone(),
            achievements: state.achievements.clone(),
            unlocked_achievements: achievements::unlocked_count(&state.achievements),
            player_rank: state.player_rank(),
            activity,
            busy: activity != Activity::Idle,
            battle_phase,
            battle: battle.cloned(),
        }
    }

    #[must_use]
    pub fn battle_log(&self) -> &[BattleLogEntry] {
        self.battle.as_ref().map(|b| b.log.as_slice()).unwrap_or(&[])
    }
}

/// Companion record plus its derived display stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionView {
    #[serde(flatten)]
    pub companion: Companion,
    pub damage: u32,
    pub speed: u32,
}

impl From<&Companion> for CompanionView {
    fn from(companion: &Companion) -> Self {
        Self {
            companion: companion.clone(),
            damage: companion.damage(),
            speed: companion.speed(),
        }
    }
}
