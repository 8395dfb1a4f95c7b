//! Token bucket admission control.
//!
//! A [`TokenBucket`] grants up to `capacity` permits per refill cadence and
//! is refilled lazily on each admission check; there is no background timer.
//! `admit()` is a non-blocking check, not a queue: callers that are rejected
//! decide for themselves whether to fail fast or come back later.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use metadata_gateway::rate_limit::TokenBucket;
//!
//! // Burst of 3, then one admission back per second.
//! let mut bucket = TokenBucket::new(3, Duration::from_secs(1));
//! assert!(bucket.admit());
//! assert!(bucket.admit());
//! assert!(bucket.admit());
//! assert!(!bucket.admit());
//! ```

use std::time::{Duration, Instant};

/// A single-resource token bucket.
///
/// Not shared across providers; each rate-limited window gets its own
/// instance. The bucket itself is not synchronized, callers that share one
/// across tasks must wrap it in a lock (see
/// [`DualWindowLimiter`](crate::rate_limit::DualWindowLimiter)).
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum number of tokens the bucket can hold.
    capacity: u32,
    /// Tokens currently available. Invariant: `0 <= tokens <= capacity`.
    tokens: u32,
    /// Time to accrue one token.
    refill_interval: Duration,
    /// Start of the interval currently accruing.
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    ///
    /// `capacity` must be greater than zero and `refill_interval` non-zero;
    /// a zero-capacity bucket would reject everything forever.
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        debug_assert!(capacity > 0, "token bucket capacity must be positive");
        debug_assert!(!refill_interval.is_zero(), "refill interval must be non-zero");
        Self {
            capacity,
            tokens: capacity,
            refill_interval,
            last_refill: Instant::now(),
        }
    }

    /// Try to take one token, refilling first.
    ///
    /// Returns `true` if a token was consumed and the request is admitted.
    pub fn admit(&mut self) -> bool {
        self.refill();
        self.consume()
    }

    /// Add tokens for every whole refill interval elapsed since `last_refill`.
    ///
    /// `last_refill` advances only by the whole intervals consumed, never to
    /// `now`, so fractional progress toward the next token is preserved.
    pub(crate) fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed();
        let interval_nanos = self.refill_interval.as_nanos();
        let whole_intervals = elapsed.as_nanos() / interval_nanos;
        if whole_intervals == 0 {
            return;
        }

        let added = u32::try_from(whole_intervals).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(added).min(self.capacity);
        // Advancing by the consumed intervals even when tokens were already
        // at capacity keeps last_refill from drifting arbitrarily far behind.
        self.last_refill += self
            .refill_interval
            .saturating_mul(added)
            .min(elapsed);
    }

    /// Whether a token is currently available. Does not refill.
    pub(crate) fn available(&self) -> bool {
        self.tokens > 0
    }

    /// Take one token. Does not refill.
    ///
    /// Returns `false` if the bucket is empty.
    pub(crate) fn consume(&mut self) -> bool {
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Tokens currently available.
    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    /// Maximum tokens the bucket can hold.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}
