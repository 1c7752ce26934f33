//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Filter used when neither `RUST_LOG` nor a configured level is given
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    init_with_level(DEFAULT_LEVEL);
}

/// Initialize the logging system with a default filter
///
/// `RUST_LOG` still wins when it is set, so a configured level only acts
/// as the fallback. A second initialisation (tests, embedding apps) is
/// not an error.
pub fn init_with_level(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}
