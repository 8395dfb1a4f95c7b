//! Provider configuration.
//!
//! Each provider is described by a static [`ProviderConfig`] record fixed at
//! gateway construction: its rate windows, cache TTL, endpoint, and optional
//! API key. Presets exist for the two providers this system talks to.
//!
//! Limits are calibrated to the providers' published budgets:
//!
//! | Provider | Short window | Long window | Cache TTL |
//! |----------|--------------|-------------|-----------|
//! | jikan    | 3 req/s      | 60 req/min  | 1 hour    |
//! | tmdb     | 40 req/10s   | 40 req/10s  | 1 hour    |

use std::time::Duration;

use secrecy::SecretString;

/// Identifier the Jikan preset is registered under.
pub const JIKAN: &str = "jikan";
/// Identifier the TMDB preset is registered under.
pub const TMDB: &str = "tmdb";

/// Default search endpoint for the Jikan (MyAnimeList) API.
pub const JIKAN_SEARCH_URL: &str = "https://api.jikan.moe/v4/anime";
/// Default multi-search endpoint for the TMDB API.
pub const TMDB_SEARCH_URL: &str = "https://api.themoviedb.org/3/search/multi";

/// Cache TTL applied to every provider unless overridden.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// One rate window: `capacity` requests per `interval`.
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    /// Requests allowed per window.
    pub capacity: u32,
    /// Length of the window.
    pub interval: Duration,
}

impl WindowConfig {
    /// Create a window of `capacity` requests per `interval`.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        Self { capacity, interval }
    }

    /// Time for the window's bucket to accrue one token.
    ///
    /// One token per full `interval`: after the initial burst of `capacity`,
    /// admissions resume at one per window. Spreading the refill across the
    /// window would let a sliding interval see up to twice the published
    /// budget (the burst plus a window's worth of refills), which providers
    /// treat as abuse.
    pub(crate) fn refill_interval(&self) -> Duration {
        self.interval
    }
}

/// The kind of upstream API, which determines how responses are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Jikan (MyAnimeList) anime search.
    Jikan,
    /// TMDB movie/TV multi-search.
    Tmdb,
}

/// Static configuration for one provider.
///
/// Records are consumed by
/// [`MetadataGatewayBuilder::provider`](crate::gateway::MetadataGatewayBuilder::provider)
/// and are not mutable once the gateway is built.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Registry key callers pass to `query`, e.g. `"jikan"`.
    pub id: String,
    /// Response decoding scheme.
    pub kind: ProviderKind,
    /// Fast window, e.g. per-second.
    pub short_window: WindowConfig,
    /// Slow window, e.g. per-minute.
    pub long_window: WindowConfig,
    /// How long successful responses stay cached.
    pub cache_ttl: Duration,
    /// Search endpoint the query string is appended to.
    pub endpoint: String,
    /// API key sent as the `api_key` query parameter, if the provider
    /// requires one.
    pub api_key: Option<SecretString>,
}

impl ProviderConfig {
    /// Preset for the Jikan anime API: 3 requests/second, 60 requests/minute.
    pub fn jikan() -> Self {
        Self {
            id: JIKAN.to_string(),
            kind: ProviderKind::Jikan,
            short_window: WindowConfig::new(3, Duration::from_secs(1)),
            long_window: WindowConfig::new(60, Duration::from_secs(60)),
            cache_ttl: DEFAULT_CACHE_TTL,
            endpoint: JIKAN_SEARCH_URL.to_string(),
            api_key: None,
        }
    }

    /// Preset for the TMDB API: 40 requests per 10-second window.
    ///
    /// TMDB publishes a single window, so both limiter windows carry the same
    /// budget.
    pub fn tmdb(api_key: impl Into<SecretString>) -> Self {
        let window = WindowConfig::new(40, Duration::from_secs(10));
        Self {
            id: TMDB.to_string(),
            kind: ProviderKind::Tmdb,
            short_window: window,
            long_window: window,
            cache_ttl: DEFAULT_CACHE_TTL,
            endpoint: TMDB_SEARCH_URL.to_string(),
            api_key: Some(api_key.into()),
        }
    }

    /// Override the endpoint (useful for testing with a mock server).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the rate windows.
    pub fn windows(mut self, short: WindowConfig, long: WindowConfig) -> Self {
        self.short_window = short;
        self.long_window = long;
        self
    }
}
