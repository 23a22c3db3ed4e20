//! # Fighter Telemetry
//!
//! Logging and metrics for peer sessions.
//!
//! ## Components
//!
//! - **Tracing**: `tracing-subscriber` registry with an `EnvFilter` and a
//!   pretty (development) or JSON (containers) fmt layer
//! - **Metrics**: Prometheus counters, gauges and histograms in a global
//!   registry, exported as text
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fighter_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CF_SERVICE_NAME` | `crypto-fighter` | Service name in logs |
//! | `CF_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `CF_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `CF_JSON_LOGS` | `false` | JSON log lines |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CHAIN_FLAGS, CONNECTION_UNSTABLE,
    HEALTH_LATENCY, PEER_MESSAGES, RECORDS_REJECTED, RECORDS_SIGNED, SIGNER_FAILURES,
    SNAPSHOTS_EMITTED, SNAPSHOTS_SUPERSEDED, WIRE_ERRORS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Initialize metrics first
    let metrics = register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}
