//! Reframe WASM - WebAssembly bindings for Reframe
//!
//! This crate provides WASM bindings to expose the reframe-core crop engine
//! and edit session to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `engine` - Crop engine (pan, zoom, preview, export)
//! - `pointer` - Mouse and touch drag handling for the preview canvas
//! - `session` - Edit history and cumulative input feed
//! - `types` - WASM-compatible wrapper for encoded images
//! - `logging` - Console logger for `log` records
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropEngine, JsEditSession } from '@reframe/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const engine = new JsCropEngine(bytes, undefined);
//! const session = new JsEditSession(undefined, 'renovation');
//! session.set_base_input(engine.export_crop());
//! ```

use wasm_bindgen::prelude::*;

mod engine;
mod logging;
mod pointer;
mod session;
mod types;

// Re-export public types
pub use engine::JsCropEngine;
pub use pointer::{JsPointerController, JsPointerOutcome};
pub use session::{JsEditSession, JsEditTicket};
pub use types::JsEncodedImage;

/// Initialize the WASM module (called automatically on load).
///
/// Installs the console logger at `info` and the console panic hook.
#[wasm_bindgen(start)]
pub fn init() {
    logging::install(log::LevelFilter::Info);
    log::debug!("reframe-wasm {} ready", version());
}

/// Change the console log level (`off`, `error`, `warn`, `info`, `debug`, `trace`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logging::install(logging::parse_level(level));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_init_is_repeatable() {
        let _guard = logging::LEVEL_LOCK.lock().unwrap();
        init();
        init();
        set_log_level("warn");
        assert_eq!(log::max_level(), log::LevelFilter::Warn);
    }
}
