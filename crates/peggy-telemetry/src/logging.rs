//! Subscriber installation.
//!
//! One global subscriber per process: an `EnvFilter` built from the
//! configured directive, then either a JSON or a human-readable fmt layer.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber is already installed, so tests and
/// embedding hosts may call this more than once.
pub fn init_logging(config: &TelemetryConfig) -> Result<bool, TelemetryError> {
    let env_filter = build_filter(&config.log_level)?;

    let installed = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(config.with_source)
            .with_line_number(config.with_source);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .is_ok()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(config.with_source)
            .with_line_number(config.with_source);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!(
            service = %config.service_name,
            level = %config.log_level,
            json = config.json_logs,
            "Logging initialized"
        );
    }
    Ok(installed)
}

pub(crate) fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}
