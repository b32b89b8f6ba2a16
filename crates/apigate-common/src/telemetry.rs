//! Telemetry initialization for Gate processing
//!
//! Installs JSON structured logging with an environment-driven filter. The
//! processing crate only emits `tracing` events; whichever binary hosts it
//! calls [`init_telemetry`] once at startup.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the default log filter
pub const LOG_FILTER_ENV: &str = "APIGATE_LOG";

/// Filter used when neither the config nor the environment sets one
pub const DEFAULT_LOG_FILTER: &str = "info,apigate=debug,kube=info";

/// Errors that can occur during telemetry initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter {
        /// The rejected directive
        filter: String,
        /// Parser detail
        message: String,
    },

    /// Failed to initialize tracing subscriber
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for telemetry initialization
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every event (e.g., "apigate-controller")
    pub service_name: String,

    /// `tracing` filter directive (e.g., "info,apigate=debug")
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "apigate".to_string(),
            log_filter: std::env::var(LOG_FILTER_ENV)
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

impl TelemetryConfig {
    /// Build the env filter for this config
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        EnvFilter::try_new(&self.log_filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: self.log_filter.clone(),
            message: e.to_string(),
        })
    }
}

/// Initialize telemetry with the given configuration
///
/// Fails if a global subscriber is already installed.
///
/// # Example
///
/// ```ignore
/// use apigate_common::telemetry::{init_telemetry, TelemetryConfig};
///
/// init_telemetry(TelemetryConfig {
///     service_name: "apigate-controller".to_string(),
///     ..Default::default()
/// })?;
/// ```
pub fn init_telemetry(config: TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = config.env_filter()?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::SubscriberInit(e.to_string())
        })?;

    tracing::info!(service = %config.service_name, "telemetry initialized");
    Ok(())
}
