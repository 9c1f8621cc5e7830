//! Browser console logging.
//!
//! `log` records from `reframe-core` go to the browser console through
//! `console_log`, and panics are reported with `console_error_panic_hook`.
//! Off wasm32 nothing is installed and only the level filter applies.

use log::LevelFilter;

/// Install the console logger and panic hook, then apply `level`.
/// Later calls only change the level.
pub(crate) fn install(level: LevelFilter) {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Trace).is_err() {
            log::debug!("console logger already installed");
        }
    }
    log::set_max_level(level);
}

/// Parse a level name from JS (`"off"`, `"error"`, ... `"trace"`).
/// Unknown names fall back to `Info`.
pub(crate) fn parse_level(name: &str) -> LevelFilter {
    name.parse().unwrap_or(LevelFilter::Info)
}

/// Serializes tests that change the global log level.
#[cfg(test)]
pub(crate) static LEVEL_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_level("off"), LevelFilter::Off);
        assert_eq!(parse_level("loud"), LevelFilter::Info);
    }

    #[test]
    fn test_install_twice_updates_level() {
        let _guard = LEVEL_LOCK.lock().unwrap();
        install(LevelFilter::Warn);
        install(LevelFilter::Debug);
        assert_eq!(log::max_level(), LevelFilter::Debug);
    }
}
