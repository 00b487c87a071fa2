//! Tracing subscriber set-up for hosts that do not bring their own.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

static LOGGER_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Builds the filter for `config`, falling back to `info` on a bad directive.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs a global fmt subscriber once per process.
///
/// Returns true if this call (or an earlier one) installed the cmdflow
/// subscriber, false if another global subscriber was already in place.
pub fn init_logging(config: &LoggingConfig) -> bool {
    *LOGGER_INITIALIZED.get_or_init(|| {
        let registry = tracing_subscriber::registry().with(env_filter(config));
        let installed = if config.json {
            registry
                .with(fmt::layer().json().with_target(true).with_thread_ids(true))
                .try_init()
                .is_ok()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_thread_ids(true))
                .try_init()
                .is_ok()
        };

        if installed {
            tracing::debug!(level = %config.level, json = config.json, "Initialized logging");
        }
        installed
    })
}
