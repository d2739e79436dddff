//! HTTP transport adapter backed by `reqwest`.
//!
//! One [`reqwest::Client`] (and so one connection pool) per
//! [`ReqwestTransport`]. Build it once at startup and share it behind an
//! `Arc`; cloning the transport also shares the pool.

use async_trait::async_trait;
use reqwest::Client;

use super::config::TransportConfig;
use crate::application::ports::{HttpTransport, TransportRequest, TransportResponse};
use crate::domain::HttpMethod;
use crate::error::{InvocationError, TransportErrorKind};

/// Pooled HTTP transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build the transport and its connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Transport`] if the TLS backend or client
    /// cannot be initialized.
    pub fn new(config: &TransportConfig) -> Result<Self, InvocationError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(config.pool_idle_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| InvocationError::transport(TransportErrorKind::Other, e.to_string()))?;

        tracing::debug!(
            timeout_secs = config.timeout_secs,
            pool_max_idle_per_host = config.pool_max_idle_per_host,
            "HTTP transport initialized"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, InvocationError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        tracing::trace!(
            url = %request.url,
            status,
            bytes = body.len(),
            "Response received"
        );

        Ok(TransportResponse::new(status, body.to_vec()))
    }
}

/// Classify a `reqwest` error into the invocation error taxonomy.
fn map_reqwest_error(error: reqwest::Error) -> InvocationError {
    if error.is_builder() {
        return InvocationError::InvalidRequest(error.to_string());
    }

    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Other
    };

    InvocationError::transport(kind, error.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn builds_from_default_config() {
        assert!(ReqwestTransport::new(&TransportConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn invalid_url_is_invalid_request() {
        let transport = ReqwestTransport::new(&TransportConfig::default()).unwrap();
        let request = TransportRequest {
            method: HttpMethod::Get,
            url: "not a url".to_string(),
            headers: Vec::new(),
            body: None,
        };

        let err = transport.send(request).await.unwrap_err();

        assert!(matches!(err, InvocationError::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn refused_connection_is_retryable_transport_error() {
        let config = TransportConfig {
            connect_timeout_secs: 1,
            ..TransportConfig::default()
        };
        let transport = ReqwestTransport::new(&config).unwrap();
        // Port 9 (discard) is closed on test hosts.
        let request = TransportRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:9/".to_string(),
            headers: Vec::new(),
            body: None,
        };

        let err = tokio::time::timeout(Duration::from_secs(5), transport.send(request))
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, InvocationError::Transport { .. }));
        assert!(err.is_retryable());
    }
}
