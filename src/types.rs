//! Domain types: query parameters, provider response models, and the unified
//! search result callers consume.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ProviderKind;

/// Query parameters for a provider search.
///
/// Keys are trimmed and lowercased on insertion and held sorted; values are
/// trimmed but keep their casing for the wire. [`normalized`](Self::normalized)
/// lowercases values too, so two logically identical queries always produce
/// the same cache key regardless of argument order or casing.
///
/// # Example
///
/// ```rust
/// use metadata_gateway::QueryParams;
///
/// let a = QueryParams::new().with("q", "Cowboy Bebop").with("limit", "5");
/// let b = QueryParams::new().with("limit", "5").with("q", "cowboy bebop");
/// assert_eq!(a.normalized(), b.normalized());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn with(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.set(key, value);
        self
    }

    /// Add or replace a parameter. The key is normalized; the value is
    /// trimmed but sent upstream as given.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) {
        self.0.insert(
            key.as_ref().trim().to_lowercase(),
            value.as_ref().trim().to_string(),
        );
    }

    /// Canonical `k=v&k=v` form used for cache keys. Values are lowercased
    /// here so casing differences share a cache entry.
    pub fn normalized(&self) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_lowercase());
        }
        out
    }

    /// Iterate over the key/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded query string of the pairs as they will go on the wire.
    pub(crate) fn to_query_string(&self) -> Result<String, serde_urlencoded::ser::Error> {
        serde_urlencoded::to_string(&self.0)
    }

    /// Check if no parameters were set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What kind of media a result describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Feature film
    Movie,
    /// TV series
    Tv,
    /// Anime series or film
    Anime,
    /// Book
    Book,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Tv => write!(f, "tv"),
            MediaKind::Anime => write!(f, "anime"),
            MediaKind::Book => write!(f, "book"),
        }
    }
}

/// One search result, unified across providers.
///
/// `external_id` is prefixed with the provider's namespace (`mal_` for Jikan,
/// `tmdb_` for TMDB) so results from different catalogs never collide when
/// the caller persists them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaResult {
    /// Namespaced upstream identifier, e.g. `mal_1` or `tmdb_550`.
    pub external_id: String,
    /// Display title.
    pub title: String,
    /// Media kind.
    pub kind: MediaKind,
    /// Synopsis or overview. Empty when the provider has none.
    pub description: String,
    /// Release or first-air date as reported by the provider.
    pub release_date: String,
    /// Poster image URL. Empty when the provider has none.
    pub poster_url: String,
    /// Provider score on a 0-10 scale.
    pub rating: f64,
}

// Upstream response models.
//
// Field sets mirror what the gateway actually consumes; unknown fields are
// ignored by serde.

/// Jikan search response envelope.
#[derive(Debug, Deserialize)]
pub struct JikanSearchResponse {
    /// Matching anime entries.
    pub data: Vec<JikanAnime>,
}

/// One anime entry from Jikan.
#[derive(Debug, Deserialize)]
pub struct JikanAnime {
    /// MyAnimeList identifier.
    pub mal_id: i64,
    /// Canonical title.
    pub title: String,
    /// Synopsis text.
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Airing dates.
    #[serde(default)]
    pub aired: JikanAired,
    /// Poster images.
    #[serde(default)]
    pub images: JikanImages,
    /// Community score, 0-10.
    #[serde(default)]
    pub score: Option<f64>,
}

/// Airing window for an anime.
#[derive(Debug, Default, Deserialize)]
pub struct JikanAired {
    /// First air date.
    #[serde(default)]
    pub from: Option<String>,
}

/// Image variants for an anime.
#[derive(Debug, Default, Deserialize)]
pub struct JikanImages {
    /// JPEG variants.
    #[serde(default)]
    pub jpg: JikanJpgImage,
}

/// JPEG poster URLs.
#[derive(Debug, Default, Deserialize)]
pub struct JikanJpgImage {
    /// Standard-size poster URL.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// TMDB multi-search response envelope.
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    /// Matching movies and TV shows.
    pub results: Vec<TmdbMedia>,
}

/// One movie or TV entry from TMDB multi-search.
///
/// TMDB uses `title`/`release_date` for movies and `name`/`first_air_date`
/// for TV shows; both pairs are optional here and reconciled during
/// conversion.
#[derive(Debug, Deserialize)]
pub struct TmdbMedia {
    /// TMDB identifier.
    pub id: i64,
    /// Movie title.
    #[serde(default)]
    pub title: Option<String>,
    /// TV show name.
    #[serde(default)]
    pub name: Option<String>,
    /// `movie`, `tv`, or `person` in multi-search responses.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Synopsis.
    #[serde(default)]
    pub overview: Option<String>,
    /// Movie release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// TV first air date.
    #[serde(default)]
    pub first_air_date: Option<String>,
    /// Poster path, relative to the TMDB image host.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Average vote, 0-10.
    #[serde(default)]
    pub vote_average: Option<f64>,
}

/// Base URL poster paths from TMDB are resolved against.
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

impl From<JikanAnime> for MediaResult {
    fn from(anime: JikanAnime) -> Self {
        MediaResult {
            external_id: format!("mal_{}", anime.mal_id),
            title: anime.title,
            kind: MediaKind::Anime,
            description: anime.synopsis.unwrap_or_default(),
            release_date: anime.aired.from.unwrap_or_default(),
            poster_url: anime.images.jpg.image_url.unwrap_or_default(),
            rating: anime.score.unwrap_or(0.0),
        }
    }
}

impl TmdbMedia {
    /// Convert to a unified result, or `None` for entries that are not
    /// watchable media (multi-search also returns people).
    fn into_media_result(self) -> Option<MediaResult> {
        let (kind, title, release_date) = match self.media_type.as_deref() {
            Some("tv") => (
                MediaKind::Tv,
                self.name?,
                self.first_air_date.unwrap_or_default(),
            ),
            Some("movie") | None => (
                MediaKind::Movie,
                self.title.or(self.name)?,
                self.release_date
                    .or(self.first_air_date)
                    .unwrap_or_default(),
            ),
            Some(_) => return None,
        };

        Some(MediaResult {
            external_id: format!("tmdb_{}", self.id),
            title,
            kind,
            description: self.overview.unwrap_or_default(),
            release_date,
            poster_url: self
                .poster_path
                .map(|path| format!("{TMDB_IMAGE_BASE}{path}"))
                .unwrap_or_default(),
            rating: self.vote_average.unwrap_or(0.0),
        })
    }
}

impl ProviderKind {
    /// Decode a raw response body into unified results.
    pub(crate) fn decode(self, body: &str) -> Result<Vec<MediaResult>, serde_json::Error> {
        match self {
            ProviderKind::Jikan => {
                let response: JikanSearchResponse = serde_json::from_str(body)?;
                Ok(response.data.into_iter().map(MediaResult::from).collect())
            }
            ProviderKind::Tmdb => {
                let response: TmdbSearchResponse = serde_json::from_str(body)?;
                Ok(response
                    .results
                    .into_iter()
                    .filter_map(TmdbMedia::into_media_result)
                    .collect())
            }
        }
    }
}
