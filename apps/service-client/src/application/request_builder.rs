//! Builds transport requests from logical invocations.

use crate::application::ports::TransportRequest;
use crate::domain::InvocationRequest;
use crate::error::InvocationError;

/// `Accept` header value for every request.
pub const ACCEPT_JSON: &str = "application/json";

/// `Content-Type` header value for requests with a body.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

/// Header carrying the per-invocation correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Joins a resolved base address with a relative path and sets JSON headers.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    extra_headers: Vec<(String, String)>,
}

impl RequestBuilder {
    /// Create a builder with the standard JSON headers only.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            extra_headers: Vec::new(),
        }
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Build the request for `invocation` against `base_address`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::InvalidRequest`] if the base address is
    /// empty.
    pub fn build(
        &self,
        base_address: &str,
        invocation: &InvocationRequest,
        request_id: &str,
    ) -> Result<TransportRequest, InvocationError> {
        let url = join_url(base_address, invocation.path())?;
        let body = invocation.wire_body().map(<[u8]>::to_vec);

        let mut headers = Vec::with_capacity(3 + self.extra_headers.len());
        headers.push(("Accept".to_string(), ACCEPT_JSON.to_string()));
        if body.is_some() {
            headers.push(("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()));
        }
        headers.push((REQUEST_ID_HEADER.to_string(), request_id.to_string()));
        headers.extend(self.extra_headers.iter().cloned());

        Ok(TransportRequest {
            method: invocation.method(),
            url,
            headers,
            body,
        })
    }
}

/// Join `base` and `path` with exactly one `/` between them.
///
/// # Errors
///
/// Returns [`InvocationError::InvalidRequest`] if `base` is blank.
pub fn join_url(base: &str, path: &str) -> Result<String, InvocationError> {
    let base = base.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(InvocationError::InvalidRequest(
            "base address is empty".to_string(),
        ));
    }

    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Ok(base.to_string());
    }

    Ok(format!("{base}/{path}"))
}
