//! # Witness Telemetry
//!
//! Structured logging for witness servers, built on `tracing-subscriber`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use witness_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_telemetry(&TelemetryConfig::from_env())?;
//!     tracing::info!("witness server starting");
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `witness-hub` | Service name attached to the startup log |
//! | `WH_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `WH_JSON_LOGS` | `false` (`true` in containers) | JSON formatted output |
//! | `WH_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to install global subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize logging for the process. Call once, early in `main`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}
