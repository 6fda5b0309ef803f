//! Tracing subscriber setup for hosts embedding the affinity core.

use tracing_subscriber::EnvFilter;

use crate::config::GeneralConfig;

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `general.log_level`.
///
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes. Safe to call more than once.
pub fn init_tracing(config: &GeneralConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json_logs {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(
            level = %config.log_level,
            json = config.json_logs,
            "Tracing initialized"
        );
    }
    installed
}
