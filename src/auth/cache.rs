//! Time-bounded cache shared across concurrent requests.
//!
//! Backs the validated-token cache and the webhook-secret cache. Expiry is
//! checked inside `get` itself, so every caller gets the same semantics:
//! an entry whose deadline has passed is absent.

use dashmap::DashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A cached value with an absolute expiration instant.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe cache mapping a key to a value with a fixed TTL.
///
/// Inserts are atomic per-key replacements; concurrent readers never observe
/// a partially written entry. Expired entries are dropped lazily on read.
pub struct ExpiringCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache whose entries live for `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Look up a live entry.
    ///
    /// Returns `None` for unknown keys and for entries whose deadline is not
    /// strictly in the future; expired entries are removed on the way out.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        // Deadline passed: logically deleted, physically removed here.
        // The guard re-checks so a concurrent refresh is never discarded.
        self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Insert or replace the entry for `key`, expiring `ttl` from now.
    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop the entry for `key`, if any (explicit revocation).
    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.remove(key);
    }

    /// Number of stored entries, live or not yet reaped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The TTL applied to inserted entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
