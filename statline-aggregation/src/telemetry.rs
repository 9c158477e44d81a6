//! Tracing subscriber initialisation.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! JSON or a human-readable `fmt` layer. Call once at startup.

use statline_core::ConfigError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "statline_cache=debug,statline_aggregation=debug,info";

/// Logging configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// Emit one JSON object per event instead of pretty text.
    pub json: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "statline".to_string(),
            json: true,
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// - `STATLINE_SERVICE_NAME` (default: "statline")
    /// - `STATLINE_LOG_JSON`: `false`/`0` switches to pretty output (default: true)
    ///
    /// `RUST_LOG` is read by [`init_tracing`] itself.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_name: std::env::var("STATLINE_SERVICE_NAME").unwrap_or(defaults.service_name),
            json: std::env::var("STATLINE_LOG_JSON")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(defaults.json),
            default_filter: defaults.default_filter,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global subscriber.
///
/// Fails with a config error when a global subscriber is already set.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().pretty().boxed()
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::InvalidValue {
            field: "tracing_subscriber".to_string(),
            value: config.service_name.clone(),
            reason: format!("failed to install subscriber: {e}"),
        })?;

    tracing::info!(
        service_name = %config.service_name,
        json = config.json,
        "Telemetry initialized"
    );

    Ok(())
}
