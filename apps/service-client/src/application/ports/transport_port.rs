//! HTTP Transport Port (Driven Port)
//!
//! One request/response exchange. Implementations hold a long-lived
//! connection pool that is shared by every call; they must never build a
//! client per request.

use async_trait::async_trait;

use crate::domain::HttpMethod;
use crate::error::InvocationError;

/// A fully built outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// Encoded body, if any.
    pub body: Option<Vec<u8>>,
}

impl TransportRequest {
    /// Look up a header value, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Port for sending HTTP requests.
///
/// Any status code is a successful exchange at this level; only network
/// failures (connect, timeout, I/O) are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and read the full response.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Transport`] on network failures and
    /// [`InvocationError::InvalidRequest`] if the request cannot be encoded.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, InvocationError>;
}
