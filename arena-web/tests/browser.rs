#![cfg(target_arch = "wasm32")]

use arena_game::{ArenaConfig, ArenaStorage, UpgradeTarget};
use arena_web::{ArenaApp, WebArenaStorage, create_web_engine};
use serde_json::json;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

fn test_config(prefix: &str) -> ArenaConfig {
    ArenaConfig {
        storage_prefix: prefix.to_string(),
        ..ArenaConfig::default()
    }
}

#[wasm_bindgen_test]
fn local_storage_round_trips_documents() {
    let storage = WebArenaStorage;
    storage.remove("arena-test.doc").unwrap();
    assert!(storage.load("arena-test.doc").unwrap().is_none());
    storage.store("arena-test.doc", &json!({"coins": 5})).unwrap();
    assert_eq!(
        storage.load("arena-test.doc").unwrap(),
        Some(json!({"coins": 5}))
    );
    storage.remove("arena-test.doc").unwrap();
}

#[wasm_bindgen_test]
fn engine_progress_survives_reload() {
    let engine = create_web_engine(test_config("arena-test-reload"));
    engine.reset();
    let mut session = engine.open_session(17);
    session.buy_item(UpgradeTarget::Strength).unwrap();
    let coins = session.state().player.coins;

    let reloaded = engine.open_session(18);
    assert_eq!(reloaded.state().player.coins, coins);
    engine.reset();
}

#[wasm_bindgen_test]
fn app_exposes_snapshot_and_rejects_reentry() {
    let app = ArenaApp::new(Some(r#"{"storage_prefix": "arena-test-app"}"#.to_string())).unwrap();
    app.reset();
    let snapshot = app.snapshot().unwrap();
    assert!(snapshot.is_object());

    app.train().unwrap();
    assert!(app.busy());
    let refused: JsValue = app.start_battle().unwrap_err();
    assert_eq!(
        refused.as_string().as_deref(),
        Some("training is already in progress")
    );
    app.reset();
    assert!(!app.busy());
}

#[wasm_bindgen_test]
fn app_rejects_bad_config() {
    assert!(ArenaApp::new(Some(r#"{"training_delay_ms": 0}"#.to_string())).is_err());
}
