//! Builds a ready-to-use client from [`ClientConfig`].

use std::sync::Arc;

use super::config::ClientConfig;
use super::http::ReqwestTransport;
use super::resolver::StaticServiceResolver;
use crate::application::TypedRestClient;
use crate::error::InvocationError;
use crate::resilience::ResilientInvoker;

/// Client over the production adapters.
pub type ServiceClient = TypedRestClient<StaticServiceResolver, ReqwestTransport>;

/// Build a client whose services, transport and policies come from `config`.
///
/// # Errors
///
/// Returns [`InvocationError::Transport`] if the HTTP client cannot be built.
pub fn build_client(config: &ClientConfig) -> Result<ServiceClient, InvocationError> {
    let transport = Arc::new(ReqwestTransport::new(&config.transport)?);
    Ok(build_client_with_transport(config, transport))
}

/// Build a client around an existing transport, sharing its connection pool.
#[must_use]
pub fn build_client_with_transport(
    config: &ClientConfig,
    transport: Arc<ReqwestTransport>,
) -> ServiceClient {
    let resolver = Arc::new(StaticServiceResolver::from_map(&config.services));
    let invoker = ResilientInvoker::from_configs(
        config.retry.to_resilience_config(),
        config.circuit_breaker.to_resilience_config(),
    );

    tracing::info!(
        services = resolver.len(),
        max_retries = config.retry.max_retries,
        failure_threshold = config.circuit_breaker.failure_threshold,
        break_duration_ms = config.circuit_breaker.break_duration_ms,
        "Service client configured"
    );

    TypedRestClient::new(resolver, transport, invoker)
}
