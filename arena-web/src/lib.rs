#![forbid(unsafe_code)]
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod app;
pub mod logger;
pub mod storage;

pub use app::{AppError, ArenaApp};
pub use storage::{WebArenaStorage, WebStorageError, create_web_engine};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logger::init(log::LevelFilter::Info);
    log::info!("power arena bindings loaded");
}

/// Change console verbosity from JS, e.g. `setLogLevel("debug")`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) {
    logger::init(logger::parse_level(level));
}
