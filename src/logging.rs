//! Tracing subscriber setup.
//!
//! Logs go to stderr; stdout belongs to the RPC channel. `RUST_LOG`, when
//! set, overrides the configured level.

use tracing_subscriber::EnvFilter;

use crate::types::settings::LoggingSettings;

/// Builds the filter from `RUST_LOG`, falling back to the configured level
/// and then to `info` if that does not parse.
pub fn env_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(settings: &LoggingSettings) -> Result<(), String> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(std::io::stderr)
        .with_target(true);

    let result = if settings.json {
        builder.json().with_current_span(false).try_init()
    } else {
        builder.compact().with_ansi(false).try_init()
    };
    result.map_err(|e| format!("failed to install log subscriber: {}", e))
}
