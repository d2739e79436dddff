//! Observability module for metrics.
//!
//! Prometheus instrumentation for breaker transitions, retries and
//! invocation outcomes. Tracing setup lives in `infrastructure::telemetry`.

pub mod metrics;

pub use self::metrics::{
    MetricsConfig, MetricsError, circuit_breaker_state, init_metrics,
    record_circuit_breaker_rejected, record_circuit_breaker_state, record_invocation, record_retry,
};
