//! Key-value persistence for the four session domains.
//!
//! Every domain is read independently at startup and falls back to its
//! default when missing or unreadable. Corrupt data is discarded, never
//! surfaced. Writes happen after each commit, one key per changed domain.
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

use crate::ArenaStorage;
use crate::achievements::{self, Achievement};
use crate::leaderboard::{self, LeaderboardEntry};
use crate::player::{Companion, Player};
use crate::session::StateObserver;
use crate::state::{ArenaSnapshot, ArenaState, ChangeSet};

/// Errors produced by storage backends shipped with this crate.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Logical records mirrored to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageDomain {
    Player,
    Companion,
    Leaderboard,
    Achievements,
}

impl StorageDomain {
    pub const ALL: [Self; 4] = [
        Self::Player,
        Self::Companion,
        Self::Leaderboard,
        Self::Achievements,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Companion => "companion",
            Self::Leaderboard => "leaderboard",
            Self::Achievements => "achievements",
        }
    }

    /// Storage key for this domain under `prefix`.
    #[must_use]
    pub fn key(self, prefix: &str) -> String {
        format!("{prefix}.{}", self.name())
    }

    #[must_use]
    pub const fn is_changed(self, changes: ChangeSet) -> bool {
        match self {
            Self::Player => changes.player,
            Self::Companion => changes.companion,
            Self::Leaderboard => changes.leaderboard,
            Self::Achievements => changes.achievements,
        }
    }
}

/// In-memory storage holding JSON text, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under `key`, bypassing serialization.
    pub fn insert_raw(&self, key: &str, raw: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Make every subsequent write fail, as a full or revoked store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl ArenaStorage for MemoryStorage {
    type Error = StorageError;

    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        match self.entries.borrow().get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn store(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        if self.fail_writes.get() {
            return Err(StorageError::Backend(format!("write rejected for {key}")));
        }
        let raw = serde_json::to_string(value)?;
        self.entries.borrow_mut().insert(key.to_string(), raw);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Mirrors session state into an [`ArenaStorage`] backend.
#[derive(Debug, Clone)]
pub struct PersistenceMirror<S> {
    storage: S,
    prefix: String,
    write_failures: u64,
}

impl<S: ArenaStorage> PersistenceMirror<S> {
    pub fn new(storage: S, prefix: &str) -> Self {
        Self {
            storage,
            prefix: prefix.to_string(),
            write_failures: 0,
        }
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Writes that failed since construction.
    #[must_use]
    pub const fn write_failures(&self) -> u64 {
        self.write_failures
    }

    /// Read all four domains, substituting defaults for anything unusable.
    #[must_use]
    pub fn load(&self) -> ArenaState {
        let player = self
            .read_domain::<Player>(StorageDomain::Player)
            .filter(Player::is_well_formed)
            .unwrap_or_default();
        let companion = self
            .read_domain::<Companion>(StorageDomain::Companion)
            .filter(Companion::is_well_formed)
            .unwrap_or_default();
        let board = self
            .read_domain::<Vec<LeaderboardEntry>>(StorageDomain::Leaderboard)
            .unwrap_or_else(leaderboard::seed_entries);
        let unlocked = self
            .read_domain::<Vec<Achievement>>(StorageDomain::Achievements)
            .unwrap_or_else(achievements::default_achievements);
        ArenaState::from_parts(player, companion, board, unlocked)
    }

    fn read_domain<T: DeserializeOwned>(&self, domain: StorageDomain) -> Option<T> {
        let key = domain.key(&self.prefix);
        match self.storage.load(&key) {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    log::warn!("discarding unreadable {key}: {err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                log::warn!("failed to read {key}, using defaults: {err}");
                None
            }
        }
    }

    /// Write every domain flagged in `changes`.
    ///
    /// Failures are logged and counted; each domain is attempted regardless
    /// of earlier failures.
    pub fn write(&mut self, state: &ArenaSnapshot, changes: ChangeSet) {
        for domain in StorageDomain::ALL {
            if !domain.is_changed(changes) {
                continue;
            }
            let result = match domain {
                StorageDomain::Player => self.write_domain(domain, &state.player),
                StorageDomain::Companion => {
                    self.write_domain(domain, &state.companion.companion)
                }
                StorageDomain::Leaderboard => self.write_domain(domain, &state.leaderboard),
                StorageDomain::Achievements => self.write_domain(domain, &state.achievements),
            };
            if let Err(err) = result {
                self.write_failures = self.write_failures.saturating_add(1);
                log::warn!("failed to persist {}: {err}", domain.name());
            }
        }
    }

    fn write_domain<T: Serialize>(
        &self,
        domain: StorageDomain,
        value: &T,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        self.storage
            .store(&domain.key(&self.prefix), &value)
            .map_err(|err| StorageError::Backend(err.to_string()))
    }

    /// Remove every persisted domain so the next load starts fresh.
    pub fn clear(&self) {
        for domain in StorageDomain::ALL {
            let key = domain.key(&self.prefix);
            if let Err(err) = self.storage.remove(&key) {
                log::warn!("failed to remove {key}: {err}");
            }
        }
    }
}

impl<S: ArenaStorage> StateObserver for PersistenceMirror<S> {
    fn on_commit(&mut self, snapshot: &ArenaSnapshot, changes: ChangeSet) {
        self.write(snapshot, changes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Activity;

    fn snapshot(state: &ArenaState) -> ArenaSnapshot {
        ArenaSnapshot::capture(state, Activity::Idle, None)
    }

    #[test]
    fn empty_storage_loads_defaults() {
        let mirror = PersistenceMirror::new(MemoryStorage::new(), "t");
        assert_eq!(mirror.load(), ArenaState::default());
    }

    #[test]
    fn writes_only_changed_domains() {
        let storage = MemoryStorage::new();
        let mut mirror = PersistenceMirror::new(storage.clone(), "t");
        let state = ArenaState::default();
        mirror.write(&snapshot(&state), ChangeSet::player());
        assert!(storage.raw("t.player").is_some());
        assert!(storage.raw("t.companion").is_none());
        assert_eq!(storage.len(), 1);

        mirror.write(&snapshot(&state), ChangeSet::ALL);
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn state_round_trips_through_mirror() {
        let storage = MemoryStorage::new();
        let mut mirror = PersistenceMirror::new(storage, "t");
        let mut state = ArenaState::default();
        state.player.coins = 999;
        state.player.wins = 3;
        state.companion.power = 40;
        state.refresh_leaderboard();
        state.refresh_achievements();
        mirror.write(&snapshot(&state), ChangeSet::ALL);
        assert_eq!(mirror.load(), state);
    }

    #[test]
    fn corrupt_domains_fall_back_independently() {
        let storage = MemoryStorage::new();
        let mut mirror = PersistenceMirror::new(storage.clone(), "t");
        let mut state = ArenaState::default();
        state.companion.power = 77;
        mirror.write(&snapshot(&state), ChangeSet::ALL);

        storage.insert_raw("t.player", "{not json");
        storage.insert_raw("t.achievements", r#"{"wrong":"shape"}"#);
        let loaded = mirror.load();
        assert_eq!(loaded.player, Player::default());
        assert_eq!(loaded.companion.power, 77);
        assert_eq!(achievements::unlocked_count(&loaded.achievements), 1);
    }

    #[test]
    fn malformed_player_is_replaced() {
        let storage = MemoryStorage::new();
        storage.insert_raw(
            "t.player",
            r#"{"level":0,"strength":10,"experience":0,"maxExperience":100,"coins":5}"#,
        );
        let mirror = PersistenceMirror::new(storage, "t");
        assert_eq!(mirror.load().player, Player::default());
    }

    #[test]
    fn write_failures_are_counted_not_raised() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let mut mirror = PersistenceMirror::new(storage.clone(), "t");
        mirror.write(&snapshot(&ArenaState::default()), ChangeSet::ALL);
        assert_eq!(mirror.write_failures(), 4);
        assert!(storage.is_empty());
    }

    #[test]
    fn backend_write_error_is_typed() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let mirror = PersistenceMirror::new(storage, "t");
        let err = mirror
            .write_domain(StorageDomain::Player, &Player::default())
            .unwrap_err();
        assert!(matches!(&err, StorageError::Backend(msg) if msg.contains("t.player")));
    }

    #[test]
    fn clear_removes_all_domains() {
        let storage = MemoryStorage::new();
        let mut mirror = PersistenceMirror::new(storage.clone(), "t");
        mirror.write(&snapshot(&ArenaState::default()), ChangeSet::ALL);
        mirror.clear();
        assert!(storage.is_empty());
    }
}
