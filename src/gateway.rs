//! The provider gateway.
//!
//! [`MetadataGateway`] is the single entry point for outbound metadata
//! queries. Per query it runs a fixed pipeline:
//!
//! 1. compute the cache key from `(provider, normalized params)`,
//! 2. cache lookup; a hit returns immediately without touching the limiter,
//! 3. on a miss, build the request URL, then consult the provider's rate
//!    limiter; a rejection fails fast with
//!    [`GatewayError::RateLimitExceeded`] and performs no I/O,
//! 4. if admitted, make exactly one network call; transport and decode
//!    failures are returned as typed errors and never cached,
//! 5. on success, cache the decoded results for the provider's TTL.
//!
//! The gateway never retries; retry policy belongs to the caller. Dropping
//! the `query` future cancels the in-flight request, but an already-consumed
//! rate limiter token is not refunded.
//!
//! Concurrent queries for the same uncached key may each reach the network;
//! the last response to arrive overwrites the cache entry. Provider responses
//! are idempotent reads, so this race is accepted rather than synchronized
//! away.

use std::collections::HashMap;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, warn};
use url::Url;

use crate::cache::ResponseCache;
use crate::config::ProviderConfig;
use crate::error::GatewayError;
use crate::rate_limit::DualWindowLimiter;
use crate::transport::{HttpTransport, Transport};
use crate::types::{MediaResult, QueryParams};

/// Rate-limited, caching façade over all metadata providers.
///
/// Construct one per process via [`MetadataGateway::builder`] and clone it
/// into each command handler; clones share the same limiter and cache state.
///
/// # Example
///
/// ```rust,no_run
/// use metadata_gateway::{MetadataGateway, ProviderConfig, QueryParams};
///
/// # #[tokio::main]
/// # async fn main() -> metadata_gateway::Result<()> {
/// let gateway = MetadataGateway::builder()
///     .provider(ProviderConfig::jikan())
///     .provider(ProviderConfig::tmdb("tmdb-api-key"))
///     .build();
///
/// let results = gateway
///     .query("jikan", &QueryParams::new().with("q", "akira"))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MetadataGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    providers: HashMap<String, ProviderHandle>,
    cache: ResponseCache<Vec<MediaResult>>,
    transport: Arc<dyn Transport>,
}

/// Per-provider state: its static configuration plus the limiter that guards
/// it.
struct ProviderHandle {
    config: ProviderConfig,
    limiter: DualWindowLimiter,
}

impl MetadataGateway {
    /// Create a new gateway builder.
    pub fn builder() -> MetadataGatewayBuilder {
        MetadataGatewayBuilder::new()
    }

    /// Query a provider, preferring the cache and respecting its rate budget.
    ///
    /// Returns the decoded results, or:
    ///
    /// - [`GatewayError::UnsupportedProvider`] for an unknown `provider` key,
    /// - [`GatewayError::RateLimitExceeded`] when the budget is exhausted
    ///   (no network call is made),
    /// - [`GatewayError::ProviderUnavailable`] on transport failure,
    /// - [`GatewayError::DecodeFailed`] on a malformed response body.
    ///
    /// Only successful responses populate the cache.
    pub async fn query(
        &self,
        provider: &str,
        params: &QueryParams,
    ) -> Result<Vec<MediaResult>, GatewayError> {
        let handle = self
            .inner
            .providers
            .get(provider)
            .ok_or_else(|| GatewayError::UnsupportedProvider(provider.to_string()))?;

        let key = cache_key(provider, params);
        if let Some(hit) = self.inner.cache.get(&key) {
            debug!(provider, %key, "cache hit");
            return Ok(hit);
        }

        // Build the URL before consulting the limiter so a misconfigured
        // endpoint fails without spending an admission.
        let url = request_url(&handle.config, params)?;

        if !handle.limiter.allow().await {
            warn!(provider, "rate limit exceeded, rejecting query");
            return Err(GatewayError::RateLimitExceeded {
                provider: provider.to_string(),
            });
        }

        debug!(provider, %key, "cache miss, fetching");
        let body = self
            .inner
            .transport
            .fetch(url.as_str())
            .await
            .map_err(|source| GatewayError::ProviderUnavailable {
                provider: provider.to_string(),
                source,
            })?;

        let results =
            handle
                .config
                .kind
                .decode(&body)
                .map_err(|source| GatewayError::DecodeFailed {
                    provider: provider.to_string(),
                    source,
                })?;

        self.inner
            .cache
            .put(key, results.clone(), handle.config.cache_ttl);
        debug!(provider, count = results.len(), "cached provider response");
        Ok(results)
    }

    /// Remaining (short, long) window tokens for a provider.
    ///
    /// Diagnostic only; the value may be stale by the time it is read.
    pub async fn remaining_budget(&self, provider: &str) -> Result<(u32, u32), GatewayError> {
        let handle = self
            .inner
            .providers
            .get(provider)
            .ok_or_else(|| GatewayError::UnsupportedProvider(provider.to_string()))?;
        Ok(handle.limiter.remaining().await)
    }

    /// Providers registered with this gateway.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.inner.providers.keys().map(String::as_str)
    }

    /// Number of cached responses, expired entries included.
    pub fn cached_responses(&self) -> usize {
        self.inner.cache.len()
    }
}

impl std::fmt::Debug for MetadataGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataGateway")
            .field(
                "providers",
                &self.inner.providers.keys().collect::<Vec<_>>(),
            )
            .field("cached_responses", &self.inner.cache.len())
            .finish()
    }
}

/// Deterministic cache key for `(provider, normalized params)`.
fn cache_key(provider: &str, params: &QueryParams) -> String {
    format!("{}:{}", provider, params.normalized())
}

/// Build the request URL: endpoint plus normalized params plus the API key,
/// if the provider has one.
fn request_url(config: &ProviderConfig, params: &QueryParams) -> Result<Url, GatewayError> {
    let mut url = Url::parse(&config.endpoint)?;

    let mut query = params.to_query_string()?;
    if let Some(api_key) = &config.api_key {
        let pair = serde_urlencoded::to_string([("api_key", api_key.expose_secret())])?;
        if query.is_empty() {
            query = pair;
        } else {
            query.push('&');
            query.push_str(&pair);
        }
    }
    if !query.is_empty() {
        url.set_query(Some(&query));
    }
    Ok(url)
}

/// Builder for [`MetadataGateway`].
pub struct MetadataGatewayBuilder {
    providers: Vec<ProviderConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl MetadataGatewayBuilder {
    /// Create a builder with no providers registered.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            transport: None,
        }
    }

    /// Register a provider. Re-registering an id replaces the earlier record.
    pub fn provider(mut self, config: ProviderConfig) -> Self {
        self.providers.push(config);
        self
    }

    /// Use a custom transport (test doubles, instrumented clients).
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the gateway.
    ///
    /// Defaults to an [`HttpTransport`] with the standard request timeout
    /// when no transport was supplied.
    pub fn build(self) -> MetadataGateway {
        let providers = self
            .providers
            .into_iter()
            .map(|config| {
                let limiter = DualWindowLimiter::new(config.short_window, config.long_window);
                (config.id.clone(), ProviderHandle { config, limiter })
            })
            .collect();

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::new()));

        MetadataGateway {
            inner: Arc::new(GatewayInner {
                providers,
                cache: ResponseCache::new(),
                transport,
            }),
        }
    }
}

impl Default for MetadataGatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::config::WindowConfig;
    use crate::transport::TransportError;

    /// Transport double that counts fetches and replays a fixed response.
    struct ScriptedTransport {
        calls: AtomicUsize,
        response: Result<String, u16>,
    }

    impl ScriptedTransport {
        fn ok(body: impl Into<String>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(body.into()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(status),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn fetch(&self, _url: &str) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(TransportError::Status(*status)),
            }
        }
    }

    fn jikan_body(title: &str) -> String {
        serde_json::json!({
            "data": [{ "mal_id": 7, "title": title, "score": 7.5 }]
        })
        .to_string()
    }

    fn gateway_with(transport: Arc<ScriptedTransport>) -> MetadataGateway {
        MetadataGateway::builder()
            .provider(ProviderConfig::jikan().endpoint("http://localhost/v4/anime"))
            .transport(transport)
            .build()
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let gateway = gateway_with(Arc::new(ScriptedTransport::ok("{}")));
        let err = gateway
            .query("imdb", &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedProvider(p) if p == "imdb"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network_and_limiter() {
        let transport = Arc::new(ScriptedTransport::ok(jikan_body("Trigun")));
        // Windows long enough that no refill can happen mid-test.
        let gateway = MetadataGateway::builder()
            .provider(
                ProviderConfig::jikan()
                    .endpoint("http://localhost/v4/anime")
                    .windows(
                        WindowConfig::new(3, Duration::from_secs(600)),
                        WindowConfig::new(60, Duration::from_secs(3600)),
                    ),
            )
            .transport(Arc::clone(&transport) as Arc<dyn Transport>)
            .build();
        let params = QueryParams::new().with("q", "trigun");

        let first = gateway.query("jikan", &params).await.unwrap();
        let second = gateway.query("jikan", &params).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1, "second query must be a cache hit");
        // The hit must not have consumed a second token.
        let (short_left, _) = gateway.remaining_budget("jikan").await.unwrap();
        assert_eq!(short_left, 2);
    }

    #[tokio::test]
    async fn test_normalized_params_share_cache_entry() {
        let transport = Arc::new(ScriptedTransport::ok(jikan_body("Akira")));
        let gateway = gateway_with(Arc::clone(&transport));

        gateway
            .query("jikan", &QueryParams::new().with("Q", " Akira "))
            .await
            .unwrap();
        gateway
            .query("jikan", &QueryParams::new().with("q", "akira"))
            .await
            .unwrap();

        assert_eq!(transport.calls(), 1);
        assert_eq!(gateway.cached_responses(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_query_fails_fast() {
        let transport = Arc::new(ScriptedTransport::ok(jikan_body("x")));
        let gateway = gateway_with(Arc::clone(&transport));

        // Jikan's short window admits 3; the 4th distinct query is rejected
        // before any I/O.
        for i in 0..3 {
            gateway
                .query("jikan", &QueryParams::new().with("q", format!("title {i}")))
                .await
                .unwrap();
        }
        let err = gateway
            .query("jikan", &QueryParams::new().with("q", "title 3"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::RateLimitExceeded { .. }));
        assert_eq!(transport.calls(), 3, "rejected query must not reach the network");
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_cached() {
        let transport = Arc::new(ScriptedTransport::failing(502));
        let gateway = gateway_with(Arc::clone(&transport));
        let params = QueryParams::new().with("q", "bebop");

        let err = gateway.query("jikan", &params).await.unwrap_err();
        assert!(matches!(err, GatewayError::ProviderUnavailable { .. }));
        assert_eq!(gateway.cached_responses(), 0);

        // The retry (caller-driven) reaches the network again.
        let _ = gateway.query("jikan", &params).await.unwrap_err();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_cached() {
        let transport = Arc::new(ScriptedTransport::ok("<html>not json</html>"));
        let gateway = gateway_with(Arc::clone(&transport));
        let params = QueryParams::new().with("q", "bebop");

        let err = gateway.query("jikan", &params).await.unwrap_err();
        assert!(matches!(err, GatewayError::DecodeFailed { .. }));
        assert_eq!(gateway.cached_responses(), 0);
    }

    #[tokio::test]
    async fn test_no_token_refund_after_downstream_failure() {
        let transport = Arc::new(ScriptedTransport::failing(500));
        let gateway = MetadataGateway::builder()
            .provider(
                ProviderConfig::jikan()
                    .endpoint("http://localhost/v4/anime")
                    .windows(
                        WindowConfig::new(3, Duration::from_secs(600)),
                        WindowConfig::new(60, Duration::from_secs(3600)),
                    ),
            )
            .transport(transport as Arc<dyn Transport>)
            .build();

        let (short_before, _) = gateway.remaining_budget("jikan").await.unwrap();
        let _ = gateway
            .query("jikan", &QueryParams::new().with("q", "x"))
            .await
            .unwrap_err();
        let (short_after, _) = gateway.remaining_budget("jikan").await.unwrap();

        // Failed calls still spend their admission.
        assert_eq!(short_after, short_before - 1);
    }

    /// Transport that never completes within the test.
    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn fetch(&self, _url: &str) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(TransportError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_cancelled_query_does_not_refund_token() {
        let gateway = MetadataGateway::builder()
            .provider(
                ProviderConfig::jikan()
                    .endpoint("http://localhost/v4/anime")
                    .windows(
                        WindowConfig::new(3, Duration::from_secs(600)),
                        WindowConfig::new(60, Duration::from_secs(3600)),
                    ),
            )
            .transport(Arc::new(StalledTransport))
            .build();

        let params = QueryParams::new().with("q", "x");
        let result =
            tokio::time::timeout(Duration::from_millis(20), gateway.query("jikan", &params)).await;
        assert!(result.is_err(), "query should still be in flight");

        // The admission was spent even though the caller gave up.
        let (short_left, _) = gateway.remaining_budget("jikan").await.unwrap();
        assert_eq!(short_left, 2);
    }

    #[tokio::test]
    async fn test_bad_endpoint_does_not_spend_budget() {
        let transport = Arc::new(ScriptedTransport::ok("{}"));
        let gateway = MetadataGateway::builder()
            .provider(ProviderConfig::jikan().endpoint("not a url"))
            .transport(Arc::clone(&transport) as Arc<dyn Transport>)
            .build();

        let err = gateway
            .query("jikan", &QueryParams::new().with("q", "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Url(_)));
        assert_eq!(transport.calls(), 0);
        // The failed URL build must not have consumed an admission.
        let (short_left, _) = gateway.remaining_budget("jikan").await.unwrap();
        assert_eq!(short_left, 3);
    }

    #[test]
    fn test_request_url_includes_api_key() {
        let config = ProviderConfig::tmdb("sekrit").endpoint("http://localhost/3/search/multi");
        let params = QueryParams::new().with("query", "dune");

        let url = request_url(&config, &params).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost/3/search/multi?query=dune&api_key=sekrit"
        );
    }

    #[test]
    fn test_request_url_rejects_bad_endpoint() {
        let config = ProviderConfig::jikan().endpoint("not a url");
        let err = request_url(&config, &QueryParams::new()).unwrap_err();
        assert!(matches!(err, GatewayError::Url(_)));
    }
}
