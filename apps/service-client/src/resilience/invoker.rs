//! Retry around circuit breaker around one transport attempt.
//!
//! This is the only place the two policies meet. The retry scheduler owns
//! the loop; each iteration goes through the target service's breaker, so an
//! open circuit short-circuits the network call and, being terminal for the
//! retry classifier, also ends the loop without further backoff.

use std::future::Future;
use std::sync::Arc;

use super::circuit_breaker::CircuitBreakerConfig;
use super::registry::CircuitBreakerRegistry;
use super::retry::{RetryConfig, RetryScheduler};
use crate::domain::ServiceId;
use crate::error::InvocationError;

/// Composes [`RetryScheduler`] with per-service circuit breakers.
#[derive(Debug, Clone, Default)]
pub struct ResilientInvoker {
    retry: RetryScheduler,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl ResilientInvoker {
    /// Create an invoker from a scheduler and a breaker registry.
    #[must_use]
    pub const fn new(retry: RetryScheduler, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        Self { retry, breakers }
    }

    /// Create an invoker with a fresh registry.
    #[must_use]
    pub fn from_configs(retry: RetryConfig, breaker: CircuitBreakerConfig) -> Self {
        Self::new(
            RetryScheduler::new(retry),
            Arc::new(CircuitBreakerRegistry::new(breaker)),
        )
    }

    /// Retry policy in use.
    #[must_use]
    pub const fn retry(&self) -> &RetryScheduler {
        &self.retry
    }

    /// Breaker registry shared by all calls through this invoker.
    #[must_use]
    pub const fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// Run `operation` for `service` under retry and circuit breaking.
    ///
    /// `operation` is called once per attempt that the breaker admits.
    pub async fn execute<T, F, Fut>(
        &self,
        service: &ServiceId,
        mut operation: F,
    ) -> Result<T, InvocationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InvocationError>>,
    {
        let breaker = self.breakers.breaker_for(service);

        self.retry
            .execute(|| {
                let attempt = operation();
                let breaker = Arc::clone(&breaker);
                async move { breaker.execute(move || attempt).await }
            })
            .await
    }
}
