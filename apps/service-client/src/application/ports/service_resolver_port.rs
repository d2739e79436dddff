//! Service Resolver Port (Driven Port)
//!
//! Maps a logical service id to the base address calls are sent to.

use async_trait::async_trait;

use crate::domain::ServiceId;
use crate::error::InvocationError;

/// Port for resolving service ids to base addresses.
///
/// Implementations may consult static configuration, DNS or a discovery
/// service. The client calls `resolve` once per invocation and does not
/// cache the result.
#[async_trait]
pub trait ServiceResolver: Send + Sync {
    /// Resolve `service` to a base address such as `http://orders:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Resolution`] if the id is unknown. The
    /// retry scheduler treats this as terminal.
    async fn resolve(&self, service: &ServiceId) -> Result<String, InvocationError>;
}
