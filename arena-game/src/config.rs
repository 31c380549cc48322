//! Runtime configuration for pacing and persistence.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_BATTLE_TICK_MS, DEFAULT_STORAGE_PREFIX, DEFAULT_TRAINING_DELAY_MS};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("storage prefix must not be empty")]
    EmptyPrefix,
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Delay between starting and committing a training action.
    #[serde(default = "ArenaConfig::default_training_delay_ms")]
    pub training_delay_ms: u32,
    /// Interval between battle turns.
    #[serde(default = "ArenaConfig::default_battle_tick_ms")]
    pub battle_tick_ms: u32,
    /// Namespace for persisted keys.
    #[serde(default = "ArenaConfig::default_storage_prefix")]
    pub storage_prefix: String,
    /// Whether closing the battle view stops a running battle.
    #[serde(default = "ArenaConfig::default_cancel_battle_on_close")]
    pub cancel_battle_on_close: bool,
}

impl ArenaConfig {
    const fn default_training_delay_ms() -> u32 {
        DEFAULT_TRAINING_DELAY_MS
    }

    const fn default_battle_tick_ms() -> u32 {
        DEFAULT_BATTLE_TICK_MS
    }

    fn default_storage_prefix() -> String {
        DEFAULT_STORAGE_PREFIX.to_string()
    }

    const fn default_cancel_battle_on_close() -> bool {
        true
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut cfg: Self = serde_json::from_str(json)?;
        cfg.storage_prefix = cfg.storage_prefix.trim().to_string();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if a delay is zero or the storage prefix is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.training_delay_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "training_delay_ms",
            });
        }
        if self.battle_tick_ms == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "battle_tick_ms",
            });
        }
        if self.storage_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            training_delay_ms: Self::default_training_delay_ms(),
            battle_tick_ms: Self::default_battle_tick_ms(),
            storage_prefix: Self::default_storage_prefix(),
            cancel_battle_on_close: Self::default_cancel_battle_on_close(),
        }
    }
}
