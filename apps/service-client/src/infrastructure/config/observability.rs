//! Observability configuration.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Metrics exporter settings. Tracing is configured from `OTEL_*` and
/// `RUST_LOG` environment variables instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,
    /// Listen address of the exporter.
    #[serde(default = "default_metrics_address")]
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: default_metrics_address(),
        }
    }
}

impl ObservabilityConfig {
    /// Parse the listen address.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the address is not `host:port`.
    pub fn metrics_socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.metrics_address.parse()
    }
}

fn default_metrics_address() -> String {
    "0.0.0.0:9090".to_string()
}
