#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements,
        clippy::panic
    )
)]

//! Service Client - Resilient Internal HTTP Invocation
//!
//! Calls internal services by logical service id over a shared pooled
//! transport. Every call runs through bounded retries with exponential
//! backoff and a per-service circuit breaker.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: `ServiceId`, `HttpMethod`, `InvocationRequest`
//! - **Resilience**: circuit breaker, retry scheduler, their composition
//! - **Application**: resolver and transport ports, request builder,
//!   typed REST client
//! - **Infrastructure**: `reqwest` transport, static resolver, YAML
//!   configuration, telemetry
//!
//! # Call Flow
//!
//! ```text
//! caller → TypedRestClient → ServiceResolver + RequestBuilder
//!        → RetryScheduler → CircuitBreaker(service) → HttpTransport
//!        → decode → caller
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Invocation value objects.
pub mod domain;

/// Invocation error taxonomy shared by every layer.
pub mod error;

/// Circuit breaker, retry and their composition.
pub mod resilience;

/// Application layer - Ports and the typed client.
pub mod application;

/// Infrastructure layer - Adapters and wiring.
pub mod infrastructure;

/// Prometheus metrics.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::{HttpTransport, ServiceResolver, TypedRestClient};
pub use domain::{HttpMethod, InvocationRequest, ServiceId};
pub use error::{InvocationError, TransportErrorKind};
pub use infrastructure::config::{ClientConfig, ConfigError, load_config};
pub use infrastructure::factory::{ServiceClient, build_client};
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitBreakerState,
    ResilientInvoker, RetryConfig, RetryEvent, RetryScheduler,
};
