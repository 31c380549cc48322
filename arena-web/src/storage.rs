use arena_game::{ArenaConfig, ArenaEngine, ArenaStorage};
use gloo::storage::errors::StorageError;
use gloo::storage::{LocalStorage, Storage};
use serde_json::Value;

/// Arena persistence backed by `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebArenaStorage;

#[derive(Debug, thiserror::Error)]
pub enum WebStorageError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for WebStorageError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SerdeError(err) => Self::Serialization(err),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl ArenaStorage for WebArenaStorage {
    type Error = WebStorageError;

    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        match LocalStorage::get::<Value>(key) {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        LocalStorage::set(key, value).map_err(Into::into)
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        LocalStorage::delete(key);
        Ok(())
    }
}

/// Create an arena engine persisting to `localStorage`.
#[must_use]
pub fn create_web_engine(config: ArenaConfig) -> ArenaEngine<WebArenaStorage> {
    ArenaEngine::new(WebArenaStorage, config)
}
