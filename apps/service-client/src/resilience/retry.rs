//! Bounded retry with exponential backoff.
//!
//! # Responsibilities
//! - Classify each attempt's outcome as retryable or terminal
//! - Wait `base_delay * 2^attempt` before retry `attempt` (1-based)
//! - Stop after `max_retries` retries and surface the last failure
//! - Emit a [`RetryEvent`] for every scheduled retry
//!
//! Retryable outcomes are transport failures and the statuses 408, 500,
//! 502, 503 and 504. Everything else, including an open circuit, ends the
//! call immediately.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::error::InvocationError;
use crate::observability::record_retry;

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay unit; retry `k` waits `base_delay * 2^k`.
    pub base_delay: Duration,
    /// Jitter factor as a fraction (e.g., 0.1 = ±10% randomization).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            base_delay: Duration::from_secs(1),
            jitter_factor: 0.0,
        }
    }
}

impl RetryConfig {
    /// Total attempts including the initial one.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before retry `attempt` (1-based), before jitter.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Sum of all backoff delays of a fully exhausted sequence.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_retries).fold(Duration::ZERO, |total, attempt| {
            total.saturating_add(self.delay_for(attempt))
        })
    }

    /// Randomize `delay` by up to ±`jitter_factor`, capped at ±100%.
    ///
    /// A zero, negative or non-finite factor disables jitter.
    fn jittered(&self, delay: Duration) -> Duration {
        if !self.jitter_factor.is_finite() || self.jitter_factor <= 0.0 {
            return delay;
        }

        let factor = self.jitter_factor.min(1.0);
        let base_millis = delay.as_millis() as f64;
        let jitter_range = base_millis * factor;
        let jitter: f64 = rand::rng().random_range(-jitter_range..=jitter_range);
        let adjusted_millis = (base_millis + jitter).max(0.0);
        Duration::from_millis(adjusted_millis as u64)
    }
}

/// A scheduled retry: which attempt, how long to wait, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEvent {
    /// Retry number (1-based).
    pub attempt: u32,
    /// Backoff before the retry.
    pub delay: Duration,
    /// Failure of the previous attempt.
    pub cause: InvocationError,
}

/// Callback invoked for each retry event.
pub type RetryObserver = Arc<dyn Fn(&RetryEvent) + Send + Sync>;

/// Re-invokes an operation on retryable failures.
#[derive(Clone, Default)]
pub struct RetryScheduler {
    config: RetryConfig,
    observer: Option<RetryObserver>,
}

impl fmt::Debug for RetryScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryScheduler")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl RetryScheduler {
    /// Create a scheduler.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Register a callback for retry events.
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&RetryEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation`, retrying retryable failures with backoff.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, InvocationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, InvocationError>>,
    {
        let mut attempt = 1;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt > self.config.max_retries {
                tracing::warn!(
                    attempts = attempt,
                    error = %error,
                    "Retry budget exhausted"
                );
                return Err(error);
            }

            let delay = self.config.jittered(self.config.delay_for(attempt));
            self.emit(RetryEvent {
                attempt,
                delay,
                cause: error,
            });

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn emit(&self, event: RetryEvent) {
        tracing::warn!(
            attempt = event.attempt,
            delay_ms = event.delay.as_millis(),
            error = %event.cause,
            "Retryable error, retrying"
        );
        record_retry(&event.cause.reason());

        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }
}
