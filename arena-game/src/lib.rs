//! Power Arena Game Engine
//!
//! Platform-agnostic core for the Power Arena progression game: training,
//! turn-based battles, the upgrade shop, the leaderboard and achievements.
//! This crate has no UI or browser dependencies.

pub mod achievements;
pub mod battle;
pub mod config;
pub mod constants;
pub mod error;
pub mod leaderboard;
pub mod numbers;
pub mod player;
pub mod progression;
pub mod rng;
pub mod session;
pub mod shop;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use achievements::{Achievement, AchievementKind};
pub use battle::{
    AttackKind, BattleLogEntry, BattleOutcome, BattlePhase, BattleReward, BattleState, Combatant,
    Side, TurnDraws, advance_turn,
};
pub use config::{ArenaConfig, ConfigError};
pub use error::ArenaError;
pub use leaderboard::LeaderboardEntry;
pub use player::{Companion, Player};
pub use progression::{CompanionDelta, PlayerDelta, TrainingOutcome, TrainingRoll};
pub use rng::{CountingRng, RngBundle};
pub use session::{ArenaSession, BattleClose, BattleTick, StateObserver};
pub use shop::{Purchase, UpgradeTarget};
pub use state::{Activity, ArenaSnapshot, ArenaState, ChangeSet, CompanionView};
pub use storage::{MemoryStorage, PersistenceMirror, StorageDomain, StorageError};

/// Key-value persistence for JSON documents.
/// Platform-specific implementations should provide this
pub trait ArenaStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the stored text is not JSON.
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, Self::Error>;

    /// Replace the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn store(&self, key: &str, value: &serde_json::Value) -> Result<(), Self::Error>;

    /// Delete the document stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the removal.
    fn remove(&self, key: &str) -> Result<(), Self::Error>;
}

/// Entry point binding a storage backend to new sessions.
pub struct ArenaEngine<S>
where
    S: ArenaStorage,
{
    storage: S,
    config: ArenaConfig,
}

impl<S> ArenaEngine<S>
where
    S: ArenaStorage + Clone + 'static,
{
    pub const fn new(storage: S, config: ArenaConfig) -> Self {
        Self { storage, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Load persisted state and open a session that mirrors every commit
    /// back into storage.
    #[must_use]
    pub fn open_session(&self, seed: u64) -> ArenaSession {
        let mirror = PersistenceMirror::new(self.storage.clone(), &self.config.storage_prefix);
        let state = mirror.load();
        log::debug!(
            "opened session for {} (seed {seed:#x})",
            state.player.nickname
        );
        let mut session = ArenaSession::new(state, self.config.clone(), seed);
        session.subscribe(Box::new(mirror));
        session
    }

    /// Forget all persisted progress.
    pub fn reset(&self) {
        PersistenceMirror::new(self.storage.clone(), &self.config.storage_prefix).clear();
        log::info!("persisted progress cleared");
    }
}
