//! Tracing initialisation.

use tracing_subscriber::EnvFilter;

use crate::config::DocrestConfig;

/// Installs a JSON `tracing` subscriber filtered by `config.log_level`.
///
/// An invalid filter directive falls back to `info`. Calling this when a
/// global subscriber is already installed leaves the existing one in place.
pub fn init_tracing(config: &DocrestConfig) {
    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(log_level = %config.log_level, "Tracing initialized");
    }
}
