//! Application Ports (Driven)
//!
//! Interfaces the typed client uses to reach the outside world:
//! - **`ServiceResolver`**: logical service id to base address
//! - **`HttpTransport`**: one HTTP round trip over a shared connection pool

mod service_resolver_port;
mod transport_port;

pub use service_resolver_port::ServiceResolver;
pub use transport_port::{HttpTransport, TransportRequest, TransportResponse};
