//! Subscriber setup: `EnvFilter` plus a pretty or JSON fmt layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global tracing subscriber.
///
/// Fails if a subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match (config.console_output, config.json_logs) {
        (false, _) => registry
            .try_init()
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?,
        (true, true) => {
            // JSON output for containers/production
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);
            registry
                .with(json_layer)
                .try_init()
                .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
        }
        (true, false) => {
            // Pretty output for development
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true);
            registry
                .with(fmt_layer)
                .try_init()
                .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
        }
    }

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Tracing initialized"
    );
    Ok(())
}
