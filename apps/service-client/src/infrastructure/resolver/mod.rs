//! Static service resolver.
//!
//! Resolves logical service ids from a fixed map, typically the
//! `services` section of the configuration file.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::application::ports::ServiceResolver;
use crate::domain::ServiceId;
use crate::error::InvocationError;

/// Resolver backed by an in-memory map of service id to base address.
#[derive(Debug, Clone, Default)]
pub struct StaticServiceResolver {
    addresses: HashMap<ServiceId, String>,
}

impl StaticServiceResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` at `base_address`, replacing any previous entry.
    #[must_use]
    pub fn with_service(
        mut self,
        service: impl Into<ServiceId>,
        base_address: impl Into<String>,
    ) -> Self {
        self.addresses.insert(service.into(), base_address.into());
        self
    }

    /// Build from the configuration's `services` map.
    #[must_use]
    pub fn from_map(services: &BTreeMap<String, String>) -> Self {
        let addresses = services
            .iter()
            .map(|(service, address)| (ServiceId::new(service.as_str()), address.clone()))
            .collect();
        Self { addresses }
    }

    /// Number of known services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

#[async_trait]
impl ServiceResolver for StaticServiceResolver {
    async fn resolve(&self, service: &ServiceId) -> Result<String, InvocationError> {
        self.addresses
            .get(service)
            .cloned()
            .ok_or_else(|| InvocationError::Resolution {
                service: service.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_registered_service() {
        let resolver = StaticServiceResolver::new().with_service("orders", "http://orders:8080");

        let address = resolver.resolve(&ServiceId::new("orders")).await.unwrap();

        assert_eq!(address, "http://orders:8080");
    }

    #[tokio::test]
    async fn unknown_service_is_resolution_error() {
        let resolver = StaticServiceResolver::new();

        let err = resolver.resolve(&ServiceId::new("billing")).await.unwrap_err();

        assert_eq!(
            err,
            InvocationError::Resolution {
                service: "billing".to_string()
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn builds_from_config_map() {
        let mut services = BTreeMap::new();
        services.insert("orders".to_string(), "http://orders:8080".to_string());
        services.insert("users".to_string(), "http://users:8080".to_string());

        let resolver = StaticServiceResolver::from_map(&services);

        assert_eq!(resolver.len(), 2);
        assert!(!resolver.is_empty());
    }
}
