//! Retry and circuit breaker configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff unit (milliseconds); retry `k` waits `base_delay_ms * 2^k`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Random perturbation of each delay, as a fraction in `[0, 1]`.
    #[serde(default)]
    pub jitter_factor: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            jitter_factor: 0.0,
        }
    }
}

impl RetrySettings {
    /// Convert to the resilience module's `RetryConfig`.
    #[must_use]
    pub const fn to_resilience_config(&self) -> crate::resilience::RetryConfig {
        crate::resilience::RetryConfig {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            jitter_factor: self.jitter_factor,
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    /// Consecutive failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time in the open state before a trial call (milliseconds).
    #[serde(default = "default_break_duration_ms")]
    pub break_duration_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            break_duration_ms: default_break_duration_ms(),
        }
    }
}

impl CircuitBreakerSettings {
    /// Convert to the resilience module's `CircuitBreakerConfig`.
    #[must_use]
    pub const fn to_resilience_config(&self) -> crate::resilience::CircuitBreakerConfig {
        crate::resilience::CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            break_duration: Duration::from_millis(self.break_duration_ms),
        }
    }
}

const fn default_max_retries() -> u32 {
    4
}

const fn default_base_delay_ms() -> u64 {
    1000
}

const fn default_failure_threshold() -> u32 {
    4
}

const fn default_break_duration_ms() -> u64 {
    3000
}
