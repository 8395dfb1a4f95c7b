//! # Metadata Gateway
//!
//! An async gateway for querying rate-limited third-party media metadata
//! providers (Jikan for anime, TMDB for movies and TV).
//!
//! Every outbound call the host application makes to a metadata provider goes
//! through a [`MetadataGateway`], which:
//!
//! - serves repeated queries from an in-memory TTL cache,
//! - enforces per-provider dual-window rate limits (exceeding a provider's
//!   budget risks a provider-side ban),
//! - performs at most one network call per admitted cache miss,
//! - returns typed results or a typed [`GatewayError`]; it never panics on
//!   provider failures.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metadata_gateway::{MetadataGateway, ProviderConfig, QueryParams};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = MetadataGateway::builder()
//!         .provider(ProviderConfig::jikan())
//!         .build();
//!
//!     let params = QueryParams::new().with("q", "cowboy bebop").with("limit", "5");
//!     let results = gateway.query("jikan", &params).await?;
//!     for media in results {
//!         println!("{} ({:.1}/10)", media.title, media.rating);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The gateway is an explicitly constructed object: clone it (cheap, all
//! state is shared behind `Arc`) and hand it to each command handler rather
//! than reaching for a global.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod rate_limit;
pub mod transport;
pub mod types;

// Re-export the types most callers need at the crate root.
pub use config::{ProviderConfig, WindowConfig};
pub use error::GatewayError;
pub use gateway::{MetadataGateway, MetadataGatewayBuilder};
pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{MediaKind, MediaResult, QueryParams};

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;
