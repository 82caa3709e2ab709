//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for the log subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name recorded on the startup event
    pub service_name: String,

    /// Filter directive (`info`, `peggy_bridge=debug,warn`, ...)
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,

    /// Include source file and line in each event
    pub with_source: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "peggy".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_source: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PEGGY_SERVICE_NAME`: Service name (default: peggy)
    /// - `PEGGY_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `PEGGY_JSON_LOGS`: JSON output (default: false, true in containers)
    /// - `PEGGY_LOG_SOURCE`: Include file and line (default: false)
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading variables through `lookup`.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("PEGGY_SERVICE_NAME").unwrap_or_else(|| "peggy".to_string()),

            log_level: lookup("PEGGY_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            json_logs: lookup("PEGGY_JSON_LOGS")
                .map(|v| is_truthy(&v))
                .unwrap_or(is_container),

            with_source: lookup("PEGGY_LOG_SOURCE")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}
