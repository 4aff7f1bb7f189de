//! Tracing subscriber setup for hosts without one.

use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, DEFAULT_LOG_FILTER};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `config.filter`. Returns `false` if a subscriber was
/// already installed, which is not an error.
pub fn init(config: &LoggingConfig) -> bool {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = select_filter(env.as_deref(), &config.filter);

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::debug!(json = config.json, "tracing subscriber installed");
    }
    installed
}

/// First parseable directive of `env` and `configured`, else [`DEFAULT_LOG_FILTER`].
pub fn select_filter(env: Option<&str>, configured: &str) -> EnvFilter {
    env.filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
