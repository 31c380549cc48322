//! JavaScript-facing controller.
//!
//! `ArenaApp` owns one session and drives its timed actions with gloo timers:
//! a one-shot `Timeout` commits training, a repeating `Interval` ticks the
//! battle. Views read state through `snapshot()` and get told about changes
//! through the `onChange` callback.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use arena_game::{
    Activity, ArenaConfig, ArenaEngine, ArenaError, ArenaSession, BattleClose, BattleTick,
    ConfigError, UpgradeTarget,
};
use gloo::timers::callback::{Interval, Timeout};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::storage::{WebArenaStorage, create_web_engine};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown shop item: {0}")]
    UnknownItem(String),
    #[error("snapshot serialization failed: {0}")]
    Snapshot(String),
}

impl From<AppError> for JsValue {
    fn from(err: AppError) -> Self {
        Self::from_str(&err.to_string())
    }
}

/// Parse an optional JSON config; missing or blank input means defaults.
///
/// # Errors
///
/// Returns an error when the document is malformed or invalid.
pub fn parse_config(json: Option<&str>) -> Result<ArenaConfig, ConfigError> {
    match json.map(str::trim) {
        None | Some("") => Ok(ArenaConfig::default()),
        Some(raw) => ArenaConfig::from_json(raw),
    }
}

/// Resolve a shop item name such as `"strength"`, `"pet"` or `"elixir"`.
///
/// # Errors
///
/// Returns [`AppError::UnknownItem`] for anything else.
pub fn parse_target(name: &str) -> Result<UpgradeTarget, AppError> {
    UpgradeTarget::parse(name).ok_or_else(|| AppError::UnknownItem(name.to_string()))
}

/// Session seed derived from the wall clock.
#[must_use]
pub const fn seed_from_clock(now_ms: f64) -> u64 {
    now_ms.to_bits() ^ 0x9E37_79B9_7F4A_7C15
}

struct AppInner {
    engine: ArenaEngine<WebArenaStorage>,
    session: ArenaSession,
    training: Option<Timeout>,
    ticker: Option<Interval>,
    /// Cancelled timer closures, dropped on the next call from JS so that a
    /// callback never frees itself.
    retired: Vec<Closure<dyn FnMut()>>,
    listener: Option<js_sys::Function>,
}

impl AppInner {
    fn retire_training(&mut self) {
        if let Some(timeout) = self.training.take() {
            self.retired.push(timeout.cancel());
        }
    }

    fn retire_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            self.retired.push(ticker.cancel());
        }
    }
}

#[wasm_bindgen]
pub struct ArenaApp {
    inner: Rc<RefCell<AppInner>>,
}

#[wasm_bindgen]
impl ArenaApp {
    /// Open the persisted session, optionally overriding config with JSON.
    ///
    /// # Errors
    ///
    /// Returns an error string when the config is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<Self, JsValue> {
        let config = parse_config(config_json.as_deref()).map_err(AppError::from)?;
        let engine = create_web_engine(config);
        let session = engine.open_session(seed_from_clock(js_sys::Date::now()));
        Ok(Self {
            inner: Rc::new(RefCell::new(AppInner {
                engine,
                session,
                training: None,
                ticker: None,
                retired: Vec::new(),
                listener: None,
            })),
        })
    }

    /// Current state as a plain JS object.
    ///
    /// # Errors
    ///
    /// Returns an error string when serialization fails.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        let snapshot = self.inner.borrow().session.snapshot();
        serde_wasm_bindgen::to_value(&snapshot)
            .map_err(|err| AppError::Snapshot(err.to_string()).into())
    }

    #[must_use]
    pub fn busy(&self) -> bool {
        self.inner.borrow().session.activity() != Activity::Idle
    }

    /// Register the callback invoked with a fresh snapshot after each change.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: js_sys::Function) {
        self.inner.borrow_mut().listener = Some(callback);
    }

    /// Start a training action that commits after the configured delay.
    ///
    /// # Errors
    ///
    /// Returns an error string while another action is outstanding.
    pub fn train(&self) -> Result<(), JsValue> {
        let delay = {
            let mut inner = self.inner.borrow_mut();
            inner.retired.clear();
            inner.session.begin_training().map_err(AppError::from)?;
            inner.session.config().training_delay_ms
        };
        let weak = Rc::downgrade(&self.inner);
        let timeout = Timeout::new(delay, move || finish_training(&weak));
        self.inner.borrow_mut().training = Some(timeout);
        emit(&self.inner);
        Ok(())
    }

    /// Pick an opponent and tick the battle on the configured interval.
    ///
    /// # Errors
    ///
    /// Returns an error string while busy or when no opponent exists.
    #[wasm_bindgen(js_name = startBattle)]
    pub fn start_battle(&self) -> Result<(), JsValue> {
        let tick = {
            let mut inner = self.inner.borrow_mut();
            inner.retired.clear();
            inner.session.start_battle().map_err(AppError::from)?;
            inner.session.config().battle_tick_ms
        };
        let weak = Rc::downgrade(&self.inner);
        let ticker = Interval::new(tick, move || tick_battle(&weak));
        self.inner.borrow_mut().ticker = Some(ticker);
        emit(&self.inner);
        Ok(())
    }

    /// Dismiss the battle view. Returns true when a running battle was cancelled.
    #[wasm_bindgen(js_name = closeBattle)]
    pub fn close_battle(&self) -> bool {
        let cancelled = {
            let mut inner = self.inner.borrow_mut();
            inner.retired.clear();
            let closed = inner.session.close_battle();
            if closed == BattleClose::Cancelled {
                inner.retire_ticker();
            }
            closed == BattleClose::Cancelled
        };
        emit(&self.inner);
        cancelled
    }

    /// Buy `item` for an explicit `cost`.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown items or insufficient coins.
    #[wasm_bindgen(js_name = buyUpgrade)]
    pub fn buy_upgrade(&self, cost: u32, item: &str) -> Result<(), JsValue> {
        let target = parse_target(item)?;
        self.mutate(|session| session.buy_upgrade(cost, target).map(|_| ()))
    }

    /// Buy `item` at its list price.
    ///
    /// # Errors
    ///
    /// Returns an error string for unknown items or insufficient coins.
    #[wasm_bindgen(js_name = buyItem)]
    pub fn buy_item(&self, item: &str) -> Result<(), JsValue> {
        let target = parse_target(item)?;
        self.mutate(|session| session.buy_item(target).map(|_| ()))
    }

    /// # Errors
    ///
    /// Returns an error string when the nickname is rejected.
    #[wasm_bindgen(js_name = setNickname)]
    pub fn set_nickname(&self, name: &str) -> Result<(), JsValue> {
        self.mutate(|session| session.set_nickname(name))
    }

    /// Stop timers, erase persisted progress and open a fresh session.
    pub fn reset(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.retire_training();
            inner.retire_ticker();
            inner.engine.reset();
            let session = inner
                .engine
                .open_session(seed_from_clock(js_sys::Date::now()));
            inner.session = session;
        }
        emit(&self.inner);
    }
}

impl ArenaApp {
    fn mutate(
        &self,
        action: impl FnOnce(&mut ArenaSession) -> Result<(), ArenaError>,
    ) -> Result<(), JsValue> {
        {
            let mut inner = self.inner.borrow_mut();
            inner.retired.clear();
            action(&mut inner.session).map_err(AppError::from)?;
        }
        emit(&self.inner);
        Ok(())
    }
}

fn finish_training(weak: &Weak<RefCell<AppInner>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    {
        let mut guard = inner.borrow_mut();
        guard.retire_training();
        if let Err(err) = guard.session.complete_training() {
            log::warn!("training timer fired without training: {err}");
        }
    }
    emit(&inner);
}

fn tick_battle(weak: &Weak<RefCell<AppInner>>) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    {
        let mut guard = inner.borrow_mut();
        match guard.session.advance_battle() {
            Ok(BattleTick::Continue) => {}
            Ok(BattleTick::Resolved(reward)) => {
                log::debug!("battle finished with {:?}", reward.outcome);
                guard.retire_ticker();
            }
            Err(err) => {
                log::warn!("battle ticker stopped: {err}");
                guard.retire_ticker();
            }
        }
    }
    emit(&inner);
}

/// Notify the listener. The borrow is released before calling into JS so
/// the callback may read the app again.
fn emit(inner: &Rc<RefCell<AppInner>>) {
    let (listener, snapshot) = {
        let guard = inner.borrow();
        let Some(listener) = guard.listener.clone() else {
            return;
        };
        (listener, guard.session.snapshot())
    };
    match serde_wasm_bindgen::to_value(&snapshot) {
        Ok(value) => {
            if let Err(err) = listener.call1(&JsValue::NULL, &value) {
                log::warn!("change listener threw: {err:?}");
            }
        }
        Err(err) => log::warn!("failed to serialize snapshot: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_config_means_defaults() {
        assert_eq!(parse_config(None).unwrap(), ArenaConfig::default());
        assert_eq!(parse_config(Some("  ")).unwrap(), ArenaConfig::default());
        let tuned = parse_config(Some(r#"{"battle_tick_ms": 200}"#)).unwrap();
        assert_eq!(tuned.battle_tick_ms, 200);
        assert!(parse_config(Some(r#"{"battle_tick_ms": 0}"#)).is_err());
    }

    #[test]
    fn shop_items_resolve_by_name() {
        assert_eq!(parse_target("pet").unwrap(), UpgradeTarget::Companion);
        assert_eq!(parse_target("Elixir").unwrap(), UpgradeTarget::Elixir);
        let err = parse_target("sword").unwrap_err();
        assert_eq!(err.to_string(), "unknown shop item: sword");
    }

    #[test]
    fn arena_errors_surface_their_message() {
        let err = AppError::from(ArenaError::TrainingInProgress);
        assert_eq!(err.to_string(), "training is already in progress");
    }

    #[test]
    fn clock_seeds_differ() {
        assert_ne!(seed_from_clock(1.0), seed_from_clock(2.0));
    }
}
