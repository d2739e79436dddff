//! Prometheus metrics for the service client.
//!
//! Provides metrics for circuit breaker state, retries and invocation
//! outcomes. Recording functions are no-ops until [`init_metrics`] installs
//! an exporter.
//!
//! # Example
//!
//! ```ignore
//! use service_client::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default()).expect("Failed to initialize metrics");
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
    /// Histogram buckets for invocation latency (in seconds).
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 9090),
            // Latency buckets from 5ms to 4 minutes (the per-attempt timeout)
            latency_buckets: vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 240.0,
            ],
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: addr,
            ..Default::default()
        }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .set_buckets(&config.latency_buckets)
        .map_err(|e| MetricsError::Configuration(e.to_string()))?
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to configure metrics exporter.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Circuit Breaker Metrics
// ============================================================================

/// Circuit breaker state values for the gauge.
pub mod circuit_breaker_state {
    /// Circuit is closed (healthy).
    pub const CLOSED: f64 = 0.0;
    /// Circuit is open (failing).
    pub const OPEN: f64 = 1.0;
    /// Circuit is half-open (testing).
    pub const HALF_OPEN: f64 = 2.0;
}

/// Update circuit breaker state gauge.
///
/// # Arguments
///
/// * `service` - Logical service id
/// * `state` - Numeric state (0=closed, 1=open, 2=`half_open`)
pub fn record_circuit_breaker_state(service: &str, state: f64) {
    gauge!(
        "service_client_circuit_state",
        "service" => service.to_string()
    )
    .set(state);
}

/// Record a call rejected by an open circuit.
pub fn record_circuit_breaker_rejected(service: &str) {
    counter!(
        "service_client_circuit_rejections_total",
        "service" => service.to_string()
    )
    .increment(1);
}

// ============================================================================
// Retry and Invocation Metrics
// ============================================================================

/// Record a scheduled retry.
///
/// # Arguments
///
/// * `reason` - Classified cause (status code or transport failure kind)
pub fn record_retry(reason: &str) {
    counter!(
        "service_client_retries_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record the final outcome of an invocation.
///
/// # Arguments
///
/// * `service` - Logical service id
/// * `method` - HTTP method
/// * `outcome` - `"success"` or the error reason
/// * `elapsed` - Wall-clock time including retries
pub fn record_invocation(service: &str, method: &str, outcome: &str, elapsed: Duration) {
    counter!(
        "service_client_invocations_total",
        "service" => service.to_string(),
        "method" => method.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        "service_client_invocation_seconds",
        "service" => service.to_string(),
        "method" => method.to_string()
    )
    .record(elapsed.as_secs_f64());
}
