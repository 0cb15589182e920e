//! Diagnostic logging to stderr.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "CHATSH_LOG";
pub const DEFAULT_LOG_DIRECTIVE: &str = "warn";

/// Filter from `CHATSH_LOG`, falling back to `warn` when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
