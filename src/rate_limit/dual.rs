//! Dual-window rate limiting.
//!
//! Metadata providers publish compound limits: Jikan allows 3 requests per
//! second AND 60 per minute; TMDB allows 40 per 10-second window. A
//! [`DualWindowLimiter`] composes a short-window and a long-window
//! [`TokenBucket`] so a request is admitted only when both budgets have room.
//!
//! # Example
//!
//! ```rust
//! use metadata_gateway::rate_limit::DualWindowLimiter;
//! use metadata_gateway::config::WindowConfig;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let limiter = DualWindowLimiter::new(
//!     WindowConfig::new(3, Duration::from_secs(1)),
//!     WindowConfig::new(60, Duration::from_secs(60)),
//! );
//! assert!(limiter.allow().await);
//! # });
//! ```

use tokio::sync::Mutex;

use crate::config::WindowConfig;
use crate::rate_limit::TokenBucket;

/// Compound rate limiter for a single provider.
///
/// Both buckets live behind one mutex so that checking and consuming is
/// atomic: concurrent callers cannot observe a state where the short bucket
/// was drained for a request the long bucket then rejected.
#[derive(Debug)]
pub struct DualWindowLimiter {
    windows: Mutex<Windows>,
}

#[derive(Debug)]
struct Windows {
    short: TokenBucket,
    long: TokenBucket,
}

impl DualWindowLimiter {
    /// Create a limiter from the short- and long-window configurations.
    ///
    /// Each window's bucket refills one token per full `interval`, so a
    /// window of 60 requests per minute allows an initial burst of 60 and
    /// then one admission per minute. No sliding interval the length of a
    /// window ever sees more than that window's budget plus one refill.
    pub fn new(short: WindowConfig, long: WindowConfig) -> Self {
        Self {
            windows: Mutex::new(Windows {
                short: TokenBucket::new(short.capacity, short.refill_interval()),
                long: TokenBucket::new(long.capacity, long.refill_interval()),
            }),
        }
    }

    /// Try to admit one request.
    ///
    /// Admits only if both windows currently have a token, consuming one from
    /// each; on rejection neither bucket is drained, so a temporarily
    /// exhausted short window cannot starve the long window (or vice versa).
    ///
    /// Non-blocking apart from the internal mutex, which is only held for the
    /// token bookkeeping. Safe to call from arbitrarily many tasks.
    pub async fn allow(&self) -> bool {
        let mut windows = self.windows.lock().await;
        windows.short.refill();
        windows.long.refill();

        if windows.short.available() && windows.long.available() {
            windows.short.consume();
            windows.long.consume();
            true
        } else {
            false
        }
    }

    /// Snapshot of (short, long) tokens currently available.
    ///
    /// Refills first, so the numbers reflect the admission `allow()` would
    /// see. Intended for logging and tests; by the time the caller looks at
    /// the values another task may have consumed them.
    pub async fn remaining(&self) -> (u32, u32) {
        let mut windows = self.windows.lock().await;
        windows.short.refill();
        windows.long.refill();
        (windows.short.tokens(), windows.long.tokens())
    }
}
