//! Centralized balance and tuning constants for Power Arena game logic.
//!
//! Gameplay numbers live here rather than in runtime configuration so that
//! balance can only change through reviewed code.

// Player defaults ----------------------------------------------------------
pub(crate) const PLAYER_START_LEVEL: u32 = 1;
pub(crate) const PLAYER_START_STRENGTH: u32 = 10;
pub(crate) const PLAYER_START_MAX_EXPERIENCE: u32 = 100;
pub(crate) const PLAYER_START_COINS: u32 = 50;
pub const DEFAULT_NICKNAME: &str = "Champion";
pub const NICKNAME_MAX_CHARS: usize = 24;

// Companion defaults -------------------------------------------------------
pub const DEFAULT_COMPANION_NAME: &str = "Draco";
pub(crate) const COMPANION_START_LEVEL: u32 = 1;
pub(crate) const COMPANION_START_MAX_EXPERIENCE: u32 = 50;
pub(crate) const COMPANION_START_POWER: u32 = 5;
pub(crate) const COMPANION_DAMAGE_PER_POWER: u32 = 2;
pub(crate) const COMPANION_SPEED_PER_LEVEL: f64 = 1.5;

// Training -----------------------------------------------------------------
/// Inclusive range of experience a player earns per training action.
pub const PLAYER_TRAINING_EXP_MIN: u32 = 10;
pub const PLAYER_TRAINING_EXP_MAX: u32 = 29;
/// Inclusive range of experience a companion earns per training action.
pub const COMPANION_TRAINING_EXP_MIN: u32 = 5;
pub const COMPANION_TRAINING_EXP_MAX: u32 = 14;
pub(crate) const PLAYER_LEVEL_UP_STRENGTH: u32 = 5;
pub(crate) const PLAYER_TRAINING_STRENGTH: u32 = 1;
pub(crate) const PLAYER_EXP_GROWTH: f64 = 1.5;
pub(crate) const COMPANION_LEVEL_UP_POWER: u32 = 3;
pub(crate) const COMPANION_EXP_GROWTH: f64 = 1.3;

// Battle -------------------------------------------------------------------
pub const COMBATANT_START_HEALTH: u32 = 100;
/// Attack rolls at or below this value miss.
pub(crate) const MISS_THRESHOLD: f64 = 0.2;
/// Player follow-up rolls above this value land a critical hit.
pub(crate) const CRITICAL_THRESHOLD: f64 = 0.85;
pub(crate) const CRITICAL_MULTIPLIER: f64 = 1.5;
pub(crate) const COMPANION_ASSIST_FACTOR: f64 = 0.5;
pub(crate) const OPPONENT_VARIANCE_BASE: f64 = 0.8;
pub(crate) const OPPONENT_VARIANCE_SPAN: f64 = 0.4;
pub const WIN_REWARD_COINS: u32 = 25;
pub const WIN_REWARD_EXPERIENCE: u32 = 30;

// Shop ---------------------------------------------------------------------
pub(crate) const STRENGTH_UPGRADE_COST: u32 = 30;
pub(crate) const STRENGTH_UPGRADE_AMOUNT: u32 = 10;
pub(crate) const COMPANION_UPGRADE_COST: u32 = 25;
pub(crate) const COMPANION_UPGRADE_AMOUNT: u32 = 5;
pub(crate) const ELIXIR_COST: u32 = 100;

// Achievements -------------------------------------------------------------
pub(crate) const STRENGTH_MILESTONE_LEVEL: u32 = 10;
pub(crate) const COMPANION_MASTERY_LEVEL: u32 = 5;
pub(crate) const FIRST_VICTORY_WINS: u32 = 1;
pub(crate) const UNDEFEATED_WINS: u32 = 10;

// Config defaults ----------------------------------------------------------
pub(crate) const DEFAULT_TRAINING_DELAY_MS: u32 = 1500;
pub(crate) const DEFAULT_BATTLE_TICK_MS: u32 = 1000;
pub(crate) const DEFAULT_STORAGE_PREFIX: &str = "power-arena";
