//! Typed REST client.
//!
//! The public surface for calling internal services by logical id:
//!
//! ```text
//! get/post/put/delete
//!   → ServiceResolver::resolve
//!   → RequestBuilder::build
//!   → ResilientInvoker (retry → breaker → HttpTransport::send)
//!   → decode
//! ```
//!
//! Non-2xx responses become [`InvocationError::Status`] inside the guarded
//! operation, so both the breaker and the retry classifier see the code.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::ports::{HttpTransport, ServiceResolver, TransportResponse};
use super::request_builder::RequestBuilder;
use crate::domain::{HttpMethod, InvocationRequest, ServiceId};
use crate::error::{InvocationError, is_retryable_status};
use crate::observability::record_invocation;
use crate::resilience::ResilientInvoker;

/// Maximum number of error body bytes kept in a `Status` error.
pub const MAX_ERROR_BODY_BYTES: usize = 512;

/// Client for JSON services addressed by logical id.
///
/// Cloning is cheap; clones share the transport, resolver and breakers.
#[derive(Debug)]
pub struct TypedRestClient<R, T> {
    resolver: Arc<R>,
    transport: Arc<T>,
    invoker: ResilientInvoker,
    builder: RequestBuilder,
}

impl<R, T> Clone for TypedRestClient<R, T> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            transport: Arc::clone(&self.transport),
            invoker: self.invoker.clone(),
            builder: self.builder.clone(),
        }
    }
}

impl<R: ServiceResolver, T: HttpTransport> TypedRestClient<R, T> {
    /// Create a client.
    #[must_use]
    pub fn new(resolver: Arc<R>, transport: Arc<T>, invoker: ResilientInvoker) -> Self {
        Self {
            resolver,
            transport,
            invoker,
            builder: RequestBuilder::new(),
        }
    }

    /// Replace the request builder (e.g. to add default headers).
    #[must_use]
    pub fn with_request_builder(mut self, builder: RequestBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Service resolver in use.
    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Resilience pipeline in use.
    #[must_use]
    pub const fn invoker(&self) -> &ResilientInvoker {
        &self.invoker
    }

    /// GET `path` on `service` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the invocation or of decoding.
    pub async fn get<V: DeserializeOwned>(
        &self,
        service: impl Into<ServiceId>,
        path: &str,
    ) -> Result<V, InvocationError> {
        let request = InvocationRequest::new(HttpMethod::Get, service, path);
        self.send(&request, decode_json::<V>).await
    }

    /// POST `body` (or `{}`) to `path` on `service`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of encoding, the invocation or decoding.
    pub async fn post<V, B>(
        &self,
        service: impl Into<ServiceId>,
        path: &str,
        body: Option<&B>,
    ) -> Result<V, InvocationError>
    where
        V: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = with_optional_body(
            InvocationRequest::new(HttpMethod::Post, service, path),
            body,
        )?;
        self.send(&request, decode_json::<V>).await
    }

    /// PUT `body` (or `{}`) to `path` on `service`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of encoding, the invocation or decoding.
    pub async fn put<V, B>(
        &self,
        service: impl Into<ServiceId>,
        path: &str,
        body: Option<&B>,
    ) -> Result<V, InvocationError>
    where
        V: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = with_optional_body(
            InvocationRequest::new(HttpMethod::Put, service, path),
            body,
        )?;
        self.send(&request, decode_json::<V>).await
    }

    /// DELETE `path` on `service`.
    ///
    /// Returns `true` on a 2xx status and `false` on a non-retryable
    /// failure status (e.g. 404).
    ///
    /// # Errors
    ///
    /// Returns transport, resolution and circuit-open failures, and
    /// retryable statuses that exhausted the retry budget.
    pub async fn delete(
        &self,
        service: impl Into<ServiceId>,
        path: &str,
    ) -> Result<bool, InvocationError> {
        let request = InvocationRequest::new(HttpMethod::Delete, service, path);
        match self.invoke(&request).await {
            Ok(_) => Ok(true),
            Err(InvocationError::Status { code, .. }) if !is_retryable_status(code) => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// Run `request` and decode a successful body with `decode`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the invocation, or whatever
    /// `decode` returns.
    pub async fn send<V, D>(
        &self,
        request: &InvocationRequest,
        decode: D,
    ) -> Result<V, InvocationError>
    where
        D: FnOnce(&[u8]) -> Result<V, InvocationError>,
    {
        let response = self.invoke(request).await?;
        decode(&response.body)
    }

    async fn invoke(
        &self,
        request: &InvocationRequest,
    ) -> Result<TransportResponse, InvocationError> {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "invocation",
            service = %request.service(),
            method = %request.method(),
            path = request.path(),
            request_id = %request_id,
        );

        let started = Instant::now();
        let result = self
            .resolve_and_execute(request, &request_id)
            .instrument(span)
            .await;

        let outcome = match &result {
            Ok(_) => "success".to_string(),
            Err(error) => {
                tracing::debug!(
                    service = %request.service(),
                    request_id = %request_id,
                    error = %error,
                    "Invocation failed"
                );
                error.reason()
            }
        };
        record_invocation(
            request.service().as_str(),
            request.method().as_str(),
            &outcome,
            started.elapsed(),
        );

        result
    }

    async fn resolve_and_execute(
        &self,
        request: &InvocationRequest,
        request_id: &str,
    ) -> Result<TransportResponse, InvocationError> {
        let base_address = self.resolver.resolve(request.service()).await?;
        let transport_request = self.builder.build(&base_address, request, request_id)?;
        let transport = &self.transport;

        self.invoker
            .execute(request.service(), || {
                let attempt = transport_request.clone();
                async move {
                    let response = transport.send(attempt).await?;
                    if response.is_success() {
                        Ok(response)
                    } else {
                        Err(status_error(&response))
                    }
                }
            })
            .await
    }
}

fn with_optional_body<B: Serialize + ?Sized>(
    request: InvocationRequest,
    body: Option<&B>,
) -> Result<InvocationRequest, InvocationError> {
    match body {
        Some(body) => request.with_json_body(body),
        None => Ok(request),
    }
}

fn status_error(response: &TransportResponse) -> InvocationError {
    let end = response.body.len().min(MAX_ERROR_BODY_BYTES);
    InvocationError::Status {
        code: response.status,
        body: String::from_utf8_lossy(&response.body[..end]).into_owned(),
    }
}

/// Decode a JSON body; an empty body decodes as `null`.
///
/// # Errors
///
/// Returns [`InvocationError::Serialization`] if the body does not match `V`.
pub fn decode_json<V: DeserializeOwned>(body: &[u8]) -> Result<V, InvocationError> {
    if body.is_empty() {
        return Ok(serde_json::from_slice(b"null")?);
    }
    Ok(serde_json::from_slice(body)?)
}
