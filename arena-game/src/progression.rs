//! Training progression for the player and companion.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPANION_EXP_GROWTH, COMPANION_LEVEL_UP_POWER, COMPANION_TRAINING_EXP_MAX,
    COMPANION_TRAINING_EXP_MIN, PLAYER_EXP_GROWTH, PLAYER_LEVEL_UP_STRENGTH,
    PLAYER_TRAINING_EXP_MAX, PLAYER_TRAINING_EXP_MIN, PLAYER_TRAINING_STRENGTH,
};
use crate::numbers::floor_scale;
use crate::player::{Companion, Player};

/// Experience drawn for a single training action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRoll {
    pub player_gain: u32,
    pub companion_gain: u32,
}

impl TrainingRoll {
    /// Draw both gains uniformly from their inclusive ranges.
    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            player_gain: rng.gen_range(PLAYER_TRAINING_EXP_MIN..=PLAYER_TRAINING_EXP_MAX),
            companion_gain: rng.gen_range(COMPANION_TRAINING_EXP_MIN..=COMPANION_TRAINING_EXP_MAX),
        }
    }
}

/// Change applied to the player by one training action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDelta {
    pub experience_gained: u32,
    pub levels_gained: u32,
    pub strength_gained: u32,
}

impl PlayerDelta {
    #[must_use]
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Change applied to the companion by one training action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanionDelta {
    pub experience_gained: u32,
    pub levels_gained: u32,
    pub power_gained: u32,
}

impl CompanionDelta {
    #[must_use]
    pub const fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Combined result of a committed training action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub player: PlayerDelta,
    pub companion: CompanionDelta,
}

/// Raise the player one level: +5 strength and a 1.5x experience threshold.
///
/// Experience is left untouched; callers that consume experience subtract
/// the old threshold before calling.
pub fn level_up_player(player: &mut Player) {
    player.level = player.level.saturating_add(1);
    player.strength = player.strength.saturating_add(PLAYER_LEVEL_UP_STRENGTH);
    player.max_experience = floor_scale(player.max_experience, PLAYER_EXP_GROWTH).max(1);
}

/// Apply `gain` experience to the player.
///
/// Crossing the threshold levels up; otherwise strength still grows by one.
/// Leveling repeats while experience stays at or above the threshold, which
/// only happens when battle rewards have pushed experience past it.
pub fn train_player(player: &mut Player, gain: u32) -> PlayerDelta {
    let mut delta = PlayerDelta {
        experience_gained: gain,
        ..PlayerDelta::default()
    };
    let strength_before = player.strength;
    player.max_experience = player.max_experience.max(1);
    let mut experience = player.experience.saturating_add(gain);
    if experience < player.max_experience {
        player.experience = experience;
        player.strength = player.strength.saturating_add(PLAYER_TRAINING_STRENGTH);
    } else {
        while experience >= player.max_experience {
            experience -= player.max_experience;
            level_up_player(player);
            delta.levels_gained += 1;
        }
        player.experience = experience;
    }
    delta.strength_gained = player.strength - strength_before;
    delta
}

/// Apply `gain` experience to the companion. Power only grows on level-up.
///
/// A single gain levels up at most once unless a loaded save already sits
/// past the threshold.
pub fn train_companion(companion: &mut Companion, gain: u32) -> CompanionDelta {
    let mut delta = CompanionDelta {
        experience_gained: gain,
        ..CompanionDelta::default()
    };
    companion.max_experience = companion.max_experience.max(1);
    let mut experience = companion.experience.saturating_add(gain);
    while experience >= companion.max_experience {
        experience -= companion.max_experience;
        companion.level = companion.level.saturating_add(1);
        companion.power = companion.power.saturating_add(COMPANION_LEVEL_UP_POWER);
        companion.max_experience =
            floor_scale(companion.max_experience, COMPANION_EXP_GROWTH).max(1);
        delta.levels_gained += 1;
        delta.power_gained += COMPANION_LEVEL_UP_POWER;
    }
    companion.experience = experience;
    delta
}

/// Apply one training roll to both entities.
pub fn apply_training(
    player: &mut Player,
    companion: &mut Companion,
    roll: TrainingRoll,
) -> TrainingOutcome {
    TrainingOutcome {
        player: train_player(player, roll.player_gain),
        companion: train_companion(companion, roll.companion_gain),
    }
}
