//! Invocation value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvocationError;

/// Body sent for POST/PUT calls without an explicit payload.
pub const EMPTY_JSON_OBJECT: &[u8] = b"{}";

/// Logical identifier of an internal service (e.g. `"orders"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// Create a new service id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// HTTP method supported by the typed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Read a resource.
    Get,
    /// Create a resource.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl HttpMethod {
    /// Get the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a JSON body.
    #[must_use]
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    /// Parse a method name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logical call: what to call and with which payload.
///
/// The body is serialized when attached, so a request is immutable and
/// cheap to re-send on every retry attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    method: HttpMethod,
    service: ServiceId,
    path: String,
    body: Option<Vec<u8>>,
}

impl InvocationRequest {
    /// Create a request without a body.
    ///
    /// POST and PUT requests without a body send an empty JSON object.
    #[must_use]
    pub fn new(method: HttpMethod, service: impl Into<ServiceId>, path: impl Into<String>) -> Self {
        Self {
            method,
            service: service.into(),
            path: path.into(),
            body: None,
        }
    }

    /// Attach a JSON-serialized body.
    pub fn with_json_body<B: Serialize + ?Sized>(
        mut self,
        body: &B,
    ) -> Result<Self, InvocationError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Attach an already-encoded JSON body.
    #[must_use]
    pub fn with_raw_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Target service.
    #[must_use]
    pub const fn service(&self) -> &ServiceId {
        &self.service
    }

    /// Path relative to the service base address.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bytes to put on the wire, if any.
    ///
    /// Bodiless POST/PUT requests yield `{}`; GET/DELETE yield their
    /// attached body or nothing.
    #[must_use]
    pub fn wire_body(&self) -> Option<&[u8]> {
        match (&self.body, self.method.has_body()) {
            (Some(body), _) => Some(body.as_slice()),
            (None, true) => Some(EMPTY_JSON_OBJECT),
            (None, false) => None,
        }
    }
}
