//! Invocation error taxonomy.
//!
//! Every layer (transport, circuit breaker, retry scheduler, typed client)
//! speaks the same tagged error. The breaker counts any variant its operation
//! returns; the retry scheduler only retries the variants listed in
//! [`InvocationError::is_retryable`].

use std::time::Duration;

use thiserror::Error;

/// HTTP status codes considered transient.
pub const RETRYABLE_STATUS_CODES: [u16; 5] = [408, 500, 502, 503, 504];

/// Network-layer failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The per-attempt deadline elapsed.
    Timeout,
    /// The connection could not be established or was reset.
    Connect,
    /// Any other I/O failure while sending or reading the response.
    Other,
}

impl TransportErrorKind {
    /// Label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Other => "io",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a service invocation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// Connection or timeout failure at the network layer.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Failure kind.
        kind: TransportErrorKind,
        /// Error details.
        message: String,
    },

    /// The remote service answered with a non-success status.
    #[error("Service returned status {code}")]
    Status {
        /// Numeric HTTP status code.
        code: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The circuit breaker rejected the call without touching the transport.
    #[error("Circuit open for service '{service}', retry in {}ms", retry_after.as_millis())]
    CircuitOpen {
        /// Service whose breaker is open.
        service: String,
        /// Time left until the breaker admits a trial call.
        retry_after: Duration,
    },

    /// Request or response body could not be encoded/decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The logical service id is unknown to the resolver.
    #[error("Unknown service: {service}")]
    Resolution {
        /// The unresolved service id.
        service: String,
    },

    /// The request could not be built (bad URL, bad header).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl InvocationError {
    /// Build a transport error.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Whether the retry scheduler may re-invoke after this error.
    ///
    /// Transport failures and the statuses in [`RETRYABLE_STATUS_CODES`]
    /// are transient. `CircuitOpen` is terminal so an open breaker never
    /// burns retry budget or backoff time.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { code, .. } => is_retryable_status(*code),
            Self::CircuitOpen { .. }
            | Self::Serialization(_)
            | Self::Resolution { .. }
            | Self::InvalidRequest(_) => false,
        }
    }

    /// Status code carried by a `Status` error.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Transport { kind, .. } => kind.as_str().to_string(),
            Self::Status { code, .. } => code.to_string(),
            Self::CircuitOpen { .. } => "circuit_open".to_string(),
            Self::Serialization(_) => "serialization".to_string(),
            Self::Resolution { .. } => "resolution".to_string(),
            Self::InvalidRequest(_) => "invalid_request".to_string(),
        }
    }
}

impl From<serde_json::Error> for InvocationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Whether an HTTP status code is in the retryable set.
#[must_use]
pub fn is_retryable_status(code: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn status(code: u16) -> InvocationError {
        InvocationError::Status {
            code,
            body: String::new(),
        }
    }

    #[test_case(408, true ; "request timeout")]
    #[test_case(500, true ; "internal server error")]
    #[test_case(502, true ; "bad gateway")]
    #[test_case(503, true ; "service unavailable")]
    #[test_case(504, true ; "gateway timeout")]
    #[test_case(400, false ; "bad request")]
    #[test_case(401, false ; "unauthorized")]
    #[test_case(404, false ; "not found")]
    #[test_case(409, false ; "conflict")]
    #[test_case(429, false ; "too many requests")]
    #[test_case(501, false ; "not implemented")]
    #[test_case(302, false ; "redirect")]
    fn status_classification(code: u16, retryable: bool) {
        assert_eq!(status(code).is_retryable(), retryable);
        assert_eq!(is_retryable_status(code), retryable);
    }

    #[test]
    fn transport_errors_are_retryable() {
        for kind in [
            TransportErrorKind::Timeout,
            TransportErrorKind::Connect,
            TransportErrorKind::Other,
        ] {
            assert!(InvocationError::transport(kind, "boom").is_retryable());
        }
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        let circuit = InvocationError::CircuitOpen {
            service: "orders".to_string(),
            retry_after: Duration::from_secs(1),
        };
        assert!(!circuit.is_retryable());
        assert!(!InvocationError::Serialization("bad".to_string()).is_retryable());
        assert!(
            !InvocationError::Resolution {
                service: "nope".to_string()
            }
            .is_retryable()
        );
        assert!(!InvocationError::InvalidRequest("bad url".to_string()).is_retryable());
    }

    #[test]
    fn status_code_is_structured() {
        assert_eq!(status(503).status_code(), Some(503));
        assert_eq!(
            InvocationError::transport(TransportErrorKind::Timeout, "t").status_code(),
            None
        );
    }

    #[test]
    fn reason_labels() {
        assert_eq!(status(502).reason(), "502");
        assert_eq!(
            InvocationError::transport(TransportErrorKind::Timeout, "t").reason(),
            "timeout"
        );
    }

    #[test]
    fn json_error_converts_to_serialization() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let converted: InvocationError = err.into();
        assert!(matches!(converted, InvocationError::Serialization(_)));
    }
}
