//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations of the application ports plus process wiring.

/// Configuration loading and validation.
pub mod config;

/// Client construction from configuration.
pub mod factory;

/// `reqwest` transport adapter.
pub mod http;

/// Static service id resolver.
pub mod resolver;

/// OpenTelemetry tracing integration.
pub mod telemetry;
