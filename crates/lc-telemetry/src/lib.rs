//! # Ledger-Client Telemetry
//!
//! Structured logging for the ledger client pipeline.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lc_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config)?;
//!     // Pipeline crates now log through the configured subscriber.
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LC_SERVICE_NAME` | `ledger-client` | Service name attached to every log line |
//! | `LC_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `LC_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LC_JSON_LOGS` | `false` (`true` in containers) | JSON instead of pretty output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to install log subscriber: {0}")]
    SubscriberInit(String),
}

/// Result type for telemetry setup
pub type TelemetryResult<T> = Result<T, TelemetryError>;
