//! Rate limiting for metadata providers.
//!
//! Providers ban clients that exceed their published budgets, so every
//! outbound request is gated by admission control. Two structures compose:
//!
//! - [`TokenBucket`]: a single-window counter with lazy refill.
//! - [`DualWindowLimiter`]: a short window and a long window checked and
//!   consumed atomically, one instance per provider.
//!
//! Admission is non-blocking. A rejected request fails fast; the gateway
//! reports [`RateLimitExceeded`](crate::GatewayError::RateLimitExceeded)
//! instead of queueing. Tokens are never refunded once consumed, even when
//! the downstream call later fails: refunding on failure would let induced
//! errors bypass the budget.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use metadata_gateway::rate_limit::DualWindowLimiter;
//! use metadata_gateway::config::WindowConfig;
//!
//! # tokio_test::block_on(async {
//! // Jikan's calibration: 3 requests/second, 60 requests/minute.
//! let limiter = DualWindowLimiter::new(
//!     WindowConfig::new(3, Duration::from_secs(1)),
//!     WindowConfig::new(60, Duration::from_secs(60)),
//! );
//!
//! assert!(limiter.allow().await);
//! # });
//! ```

mod bucket;
mod dual;

pub use bucket::TokenBucket;
pub use dual::DualWindowLimiter;
