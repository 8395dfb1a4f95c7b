//! Error types for the metadata gateway.

use thiserror::Error;

use crate::transport::TransportError;

/// The main error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The provider's rate limiter rejected the request.
    ///
    /// Transient. The gateway never retries on the caller's behalf; surface a
    /// "try again later" message or retry after a delay.
    #[error("rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        /// Provider whose budget was exhausted.
        provider: String,
    },

    /// The network request to the provider failed.
    #[error("provider '{provider}' unavailable: {source}")]
    ProviderUnavailable {
        /// Provider that could not be reached.
        provider: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The provider returned a response body that could not be decoded.
    #[error("failed to decode response from provider '{provider}': {source}")]
    DecodeFailed {
        /// Provider that sent the malformed response.
        provider: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// No provider is registered under the given identifier.
    #[error("unsupported provider '{0}'")]
    UnsupportedProvider(String),

    /// URL parsing error (misconfigured provider endpoint)
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Query parameters could not be encoded into a query string
    #[error("invalid query parameters: {0}")]
    InvalidQuery(#[from] serde_urlencoded::ser::Error),
}

impl GatewayError {
    /// Check if the error is transient and worth retrying later.
    ///
    /// Rate limit rejections and transport failures may succeed on a later
    /// attempt; decode failures and unknown providers will not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimitExceeded { .. } | GatewayError::ProviderUnavailable { .. }
        )
    }

    /// The provider this error relates to, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            GatewayError::RateLimitExceeded { provider }
            | GatewayError::ProviderUnavailable { provider, .. }
            | GatewayError::DecodeFailed { provider, .. } => Some(provider),
            GatewayError::UnsupportedProvider(provider) => Some(provider),
            _ => None,
        }
    }
}
