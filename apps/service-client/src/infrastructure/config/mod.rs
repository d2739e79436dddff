//! Configuration for the service client.
//!
//! Loads YAML with `${VAR}` / `${VAR:-default}` environment interpolation,
//! then validates it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use service_client::infrastructure::config::load_config;
//!
//! // Load from default path (service-client.yaml)
//! let config = load_config(None)?;
//!
//! println!("orders at {}", config.services["orders"]);
//! ```
//!
//! # Example file
//!
//! ```yaml
//! transport:
//!   timeout_secs: 240
//! retry:
//!   max_retries: 4
//!   base_delay_ms: 1000
//! circuit_breaker:
//!   failure_threshold: 4
//!   break_duration_ms: 3000
//! services:
//!   orders: ${ORDERS_URL:-http://localhost:8081}
//! ```

mod observability;
mod resilience;
mod transport;

use std::collections::BTreeMap;
use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use observability::ObservabilityConfig;
pub use resilience::{CircuitBreakerSettings, RetrySettings};
pub use transport::TransportConfig;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "service-client.yaml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Shared transport settings.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Retry policy.
    #[serde(default)]
    pub retry: RetrySettings,
    /// Circuit breaker policy (applied per service).
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,
    /// Logical service id to base URL.
    #[serde(default)]
    pub services: BTreeMap<String, String>,
    /// Metrics exporter settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to `service-client.yaml`.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<ClientConfig, ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// # Errors
///
/// Returns a `ConfigError` if an existing file cannot be read, parsed, or
/// validated.
pub fn load_config_or_default(path: Option<&str>) -> Result<ClientConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::ReadError { path, source }) if source.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path, "Config file not found, using defaults");
            Ok(ClientConfig::default())
        }
        other => other,
    }
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<ClientConfig, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: ClientConfig = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax. An unset or empty
/// variable without a default becomes an empty string.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |caps: &regex::Captures<'_>| {
        let default_value = caps.get(2).map_or("", |m| m.as_str());
        match caps.get(1).map(|m| std::env::var(m.as_str())) {
            Some(Ok(value)) if !value.is_empty() => value,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.transport.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "transport.timeout_secs must be positive".to_string(),
        ));
    }

    if config.circuit_breaker.failure_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "circuit_breaker.failure_threshold must be positive".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.retry.jitter_factor) {
        return Err(ConfigError::ValidationError(
            "retry.jitter_factor must be between 0.0 and 1.0".to_string(),
        ));
    }

    for (service, address) in &config.services {
        let url = reqwest::Url::parse(address).map_err(|e| {
            ConfigError::ValidationError(format!(
                "services.{service}: invalid URL '{address}': {e}"
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "services.{service}: unsupported scheme '{}'",
                url.scheme()
            )));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_socket_addr().is_err()
    {
        return Err(ConfigError::ValidationError(format!(
            "observability.metrics_address '{}' is not a socket address",
            config.observability.metrics_address
        )));
    }

    Ok(())
}
