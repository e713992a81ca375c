//! Tracing subscriber setup

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry configuration errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for log output
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Enable console logging
    pub enable_console: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: false,
            enable_console: true,
        }
    }
}

impl TracingConfig {
    /// Create config from environment variables
    ///
    /// - TAPROOM_LOG_FORMAT: "json" for structured output
    /// - TAPROOM_LOG_CONSOLE: "false" or "0" to silence the fmt layer
    pub fn from_env() -> Self {
        let json = std::env::var("TAPROOM_LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let enable_console = std::env::var("TAPROOM_LOG_CONSOLE")
            .map(|v| !(v == "false" || v == "0"))
            .unwrap_or(true);

        Self {
            json,
            enable_console,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_filter)
                .map_err(|_| TelemetryError::InvalidFilter(self.default_filter.clone())),
        }
    }
}

/// Install the global tracing subscriber.
///
/// Must be called once at startup.
///
/// # Errors
///
/// Returns `SubscriberInit` if a global subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<(), TelemetryError> {
    let subscriber = tracing_subscriber::registry().with(config.env_filter()?);

    let result = match (config.enable_console, config.json) {
        (true, true) => subscriber
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
        (true, false) => subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init(),
        (false, _) => subscriber.try_init(),
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(json = config.json, "Tracing initialized");

    Ok(())
}
