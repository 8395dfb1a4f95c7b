//! HTTP transport seam.
//!
//! The gateway performs network I/O through the [`Transport`] trait so tests
//! can count calls or fail deterministically without a real server. The
//! production implementation is [`HttpTransport`], a thin `reqwest` wrapper
//! with request tracing and a bounded timeout.
//!
//! The gateway never retries: a failed fetch surfaces as
//! [`ProviderUnavailable`](crate::GatewayError::ProviderUnavailable) and the
//! caller decides what to do. Dropping the future returned by
//! [`Transport::fetch`] aborts the in-flight request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use thiserror::Error;

/// Default timeout for a single provider request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure modes of a single fetch.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The provider answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection, TLS, or protocol failure.
    #[error(transparent)]
    Http(#[from] reqwest_middleware::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Http(reqwest_middleware::Error::Reqwest(err))
        }
    }
}

/// Performs a single GET request and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, returning the body on a 2xx response.
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// Production transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ClientWithMiddleware,
}

impl HttpTransport {
    /// Create a transport with the default request timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a transport with a custom request timeout.
    ///
    /// The timeout bounds the whole request, connect through body read.
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        let user_agent = format!("metadata-gateway/{}", env!("CARGO_PKG_VERSION"));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("metadata-gateway"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self.client.get(url).send().await.map_err(|err| match err {
            reqwest_middleware::Error::Reqwest(inner) if inner.is_timeout() => {
                TransportError::Timeout
            }
            other => TransportError::Http(other),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
