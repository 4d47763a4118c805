//! Logging initialization utilities.

use env_logger::Env;

/// Initialize logging with a default filter level.
pub fn init() {
    let env = Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();
}

/// Like [`init`], but tolerates an already-installed logger. Intended for
/// tests and embedders that may initialize logging more than once.
pub fn try_init() {
    let env = Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}
