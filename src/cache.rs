//! Time-to-live cache for provider responses.
//!
//! Successful provider responses are cached so repeated queries within the
//! TTL never reach the network. Entries are evicted lazily: the first `get`
//! that observes an expired entry removes it. There is no background sweep,
//! which means entries for keys that are never re-queried linger until
//! process exit; choose TTLs with that in mind or call
//! [`ResponseCache::evict_expired`] from a housekeeping task.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use metadata_gateway::cache::ResponseCache;
//!
//! let cache: ResponseCache<String> = ResponseCache::new();
//! cache.put("jikan:q=bebop".to_string(), "payload".to_string(), Duration::from_secs(3600));
//! assert_eq!(cache.get("jikan:q=bebop"), Some("payload".to_string()));
//! ```

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A cached payload and its expiry deadline.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    expires_at: Instant,
}

/// Concurrent TTL cache keyed by string.
///
/// Backed by a sharded concurrent map, so reads and writes from many
/// in-flight queries only contend per shard. Two callers racing to evict the
/// same expired key is harmless: the second removal is a no-op.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> ResponseCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a payload, evicting it first if it has expired.
    ///
    /// Returns `None` both for absent keys and for entries past their
    /// `expires_at`; an expired entry is removed before reporting the miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => {
                if Instant::now() <= entry.expires_at {
                    return Some(entry.payload.clone());
                }
                true
            }
            None => return None,
        };

        if expired {
            // remove_if re-checks under the shard lock so a concurrent put of
            // a fresh entry for the same key is not thrown away.
            self.entries
                .remove_if(key, |_, entry| Instant::now() > entry.expires_at);
        }
        None
    }

    /// Insert or overwrite a payload unconditionally.
    pub fn put(&self, key: String, payload: V, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove every expired entry.
    ///
    /// Optional housekeeping; lazy eviction on `get` already guarantees that
    /// expired entries are never returned as hits.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now <= entry.expires_at);
    }

    /// Number of entries currently stored, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
