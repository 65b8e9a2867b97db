//! Structured logging.
//!
//! Every pipeline crate logs through `tracing` with a fixed set of field
//! names so that log lines can be joined on them:
//! - `tx_id`: transaction id
//! - `node`: endorsing peer or orderer name
//! - `channel`: channel name
//! - `stage`: pipeline crate (`lc-01` .. `lc-04`)

use crate::{TelemetryConfig, TelemetryError, TelemetryResult};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// # Errors
///
/// `Filter` for an unparsable level directive, `SubscriberInit` if a global
/// subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter {
            filter: config.log_level.clone(),
            reason: e.to_string(),
        })?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
        return Ok(());
    }

    if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log a transaction-scoped event with standard fields.
///
/// ```rust,ignore
/// log_tx_event!(info, "lc-03", "Transaction committed", tx_id, block = 7);
/// ```
#[macro_export]
macro_rules! log_tx_event {
    ($level:ident, $stage:expr, $msg:expr, $tx_id:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            stage = $stage,
            tx_id = %$tx_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a node-scoped event with standard fields.
#[macro_export]
macro_rules! log_node_event {
    ($level:ident, $stage:expr, $msg:expr, $node:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            stage = $stage,
            node = %$node,
            $($($field)*,)?
            $msg
        )
    };
}
