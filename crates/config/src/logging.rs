//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::settings::LoggingSettings;
use crate::ConfigError;

/// Filter used when RUST_LOG is not set
pub fn default_filter(settings: &LoggingSettings) -> String {
    format!("booking_agent={}", settings.level.to_lowercase())
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured level. Fails if a global subscriber
/// is already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), ConfigError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(settings)));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    subscriber
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::Environment(e.to_string()))
}
