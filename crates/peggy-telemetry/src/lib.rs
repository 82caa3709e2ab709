//! # Peggy Telemetry
//!
//! Structured logging for the bridge and the hosts embedding it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use peggy_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PEGGY_SERVICE_NAME` | `peggy` | Service name on the startup event |
//! | `PEGGY_LOG_LEVEL` | `RUST_LOG`, then `info` | Filter directive |
//! | `PEGGY_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `PEGGY_LOG_SOURCE` | `false` | File and line on each event |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {directive:?}: {reason}")]
    Filter { directive: String, reason: String },
}
