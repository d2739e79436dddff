//! Resilience patterns for outgoing service calls.
//!
//! - [`CircuitBreaker`]: per-service state machine that fails fast while a
//!   service keeps failing
//! - [`RetryScheduler`]: bounded exponential backoff for transient failures
//! - [`ResilientInvoker`]: retry around breaker around one attempt

mod circuit_breaker;
mod invoker;
mod registry;
mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics, CircuitBreakerState,
};
pub use invoker::ResilientInvoker;
pub use registry::CircuitBreakerRegistry;
pub use retry::{RetryConfig, RetryEvent, RetryObserver, RetryScheduler};
