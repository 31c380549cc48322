//! Player and companion records.
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPANION_DAMAGE_PER_POWER, COMPANION_SPEED_PER_LEVEL, COMPANION_START_LEVEL,
    COMPANION_START_MAX_EXPERIENCE, COMPANION_START_POWER, DEFAULT_COMPANION_NAME,
    DEFAULT_NICKNAME, NICKNAME_MAX_CHARS, PLAYER_START_COINS, PLAYER_START_LEVEL,
    PLAYER_START_MAX_EXPERIENCE, PLAYER_START_STRENGTH,
};
use crate::leaderboard;
use crate::numbers::floor_scale;

/// The player's character.
///
/// `experience < max_experience` holds after every training commit. Battle
/// rewards add experience without a level-up pass, so a freshly rewarded
/// player may sit at or above the threshold until the next training action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub level: u32,
    pub strength: u32,
    pub experience: u32,
    pub max_experience: u32,
    pub coins: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default = "default_nickname")]
    pub nickname: String,
}

fn default_nickname() -> String {
    DEFAULT_NICKNAME.to_string()
}

impl Default for Player {
    fn default() -> Self {
        Self {
            level: PLAYER_START_LEVEL,
            strength: PLAYER_START_STRENGTH,
            experience: 0,
            max_experience: PLAYER_START_MAX_EXPERIENCE,
            coins: PLAYER_START_COINS,
            wins: 0,
            losses: 0,
            nickname: default_nickname(),
        }
    }
}

impl Player {
    /// Fraction of the current level completed, for progress bars.
    #[must_use]
    pub fn experience_ratio(&self) -> f64 {
        if self.max_experience == 0 {
            return 0.0;
        }
        f64::from(self.experience) / f64::from(self.max_experience)
    }

    /// Whether the record satisfies the basic shape rules of a loaded save.
    ///
    /// The nickname follows the same rules as a rename, so a save can never
    /// claim a built-in opponent's row.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let nickname = self.nickname.trim();
        self.level > 0
            && self.strength > 0
            && self.max_experience > 0
            && !nickname.is_empty()
            && nickname.chars().count() <= NICKNAME_MAX_CHARS
            && !leaderboard::is_seed_nickname(nickname)
    }
}

/// The companion creature that trains alongside the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Companion {
    pub name: String,
    pub level: u32,
    pub experience: u32,
    pub max_experience: u32,
    pub power: u32,
}

impl Default for Companion {
    fn default() -> Self {
        Self {
            name: DEFAULT_COMPANION_NAME.to_string(),
            level: COMPANION_START_LEVEL,
            experience: 0,
            max_experience: COMPANION_START_MAX_EXPERIENCE,
            power: COMPANION_START_POWER,
        }
    }
}

impl Companion {
    /// Displayed damage rating.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.power.saturating_mul(COMPANION_DAMAGE_PER_POWER)
    }

    /// Displayed speed rating.
    #[must_use]
    pub fn speed(&self) -> u32 {
        floor_scale(self.level, COMPANION_SPEED_PER_LEVEL)
    }

    #[must_use]
    pub fn experience_ratio(&self) -> f64 {
        if self.max_experience == 0 {
            return 0.0;
        }
        f64::from(self.experience) / f64::from(self.max_experience)
    }

    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.level > 0 && self.power > 0 && self.max_experience > 0
    }
}
