//! Per-service circuit breakers.
//!
//! One state machine per logical service id, created on first use with the
//! shared configuration. A burst of failures from one service never opens
//! the circuit of another.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics};
use crate::domain::ServiceId;

/// Collection of circuit breakers keyed by service id.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: RwLock<HashMap<ServiceId, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    /// Configuration applied to newly created breakers.
    #[must_use]
    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the breaker for `service`, creating it if needed.
    #[must_use]
    pub fn breaker_for(&self, service: &ServiceId) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().get(service) {
            return Arc::clone(breaker);
        }

        let mut breakers = self.breakers.write();
        let breaker = breakers.entry(service.clone()).or_insert_with(|| {
            tracing::debug!(service = %service, "Creating circuit breaker");
            Arc::new(CircuitBreaker::new(service.as_str(), self.config.clone()))
        });
        Arc::clone(breaker)
    }

    /// Get the breaker for `service` if one exists.
    #[must_use]
    pub fn get(&self, service: &ServiceId) -> Option<Arc<CircuitBreaker>> {
        self.breakers.read().get(service).cloned()
    }

    /// Number of services with a breaker.
    #[must_use]
    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    /// Whether no breaker has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakers.read().is_empty()
    }

    /// Get all metrics, sorted by service name.
    #[must_use]
    pub fn all_metrics(&self) -> Vec<CircuitBreakerMetrics> {
        let mut metrics: Vec<_> = self
            .breakers
            .read()
            .values()
            .map(|breaker| breaker.metrics())
            .collect();
        metrics.sort_by(|a, b| a.name.cmp(&b.name));
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::CircuitBreakerState;

    #[test]
    fn breaker_is_created_once_per_service() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
        let orders = ServiceId::new("orders");

        let first = registry.breaker_for(&orders);
        let second = registry.breaker_for(&orders);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(first.name(), "orders");
    }

    #[test]
    fn services_are_isolated() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
        let orders = ServiceId::new("orders");
        let users = ServiceId::new("users");

        registry.breaker_for(&orders).force_open();

        assert_eq!(
            registry.breaker_for(&orders).state(),
            CircuitBreakerState::Open
        );
        assert_eq!(
            registry.breaker_for(&users).state(),
            CircuitBreakerState::Closed
        );
    }

    #[test]
    fn get_does_not_create() {
        let registry = CircuitBreakerRegistry::default();
        assert!(registry.get(&ServiceId::new("orders")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn all_metrics_sorted_by_name() {
        let registry = CircuitBreakerRegistry::default();
        let _ = registry.breaker_for(&ServiceId::new("users"));
        let _ = registry.breaker_for(&ServiceId::new("billing"));

        let names: Vec<_> = registry
            .all_metrics()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["billing", "users"]);
    }

    #[test]
    fn new_breakers_use_registry_config() {
        let config = CircuitBreakerConfig {
            failure_threshold: 9,
            ..CircuitBreakerConfig::default()
        };
        let registry = CircuitBreakerRegistry::new(config.clone());
        assert_eq!(
            registry.breaker_for(&ServiceId::new("orders")).config(),
            &config
        );
    }
}
