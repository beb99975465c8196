//! Response cache for provider clients.
//!
//! [`Cache`] is the seam clients depend on; [`TtlCache`] is the in-process
//! implementation. Expiry is lazy: an entry is only checked when it is read,
//! and an expired entry is removed and reported as a miss.

use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::DashMap;

/// Key/value store with per-entry time-to-live.
pub trait Cache: Send + Sync {
    /// Return the payload for `key` if present and not expired.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Store `payload` under `key` for `ttl`.
    fn set(&self, key: &str, payload: Bytes, ttl: Duration);

    /// Remove `key` if present.
    fn delete(&self, key: &str);
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Bytes,
    expires_at: Instant,
}

/// Concurrent in-memory cache with lazily checked expiry.
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: DashMap<String, CacheEntry>,
}

impl TtlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cache for TtlCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.payload.clone());
            }
        } else {
            return None;
        }

        // Only drop the entry if it is still the expired one; a concurrent
        // writer may have replaced it since the read above.
        self.entries.remove_if(key, |_, e| e.expires_at <= now);
        None
    }

    fn set(&self, key: &str, payload: Bytes, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    fn delete(&self, key: &str) {
        self.entries.remove(key);
    }
}

/// Build a normalized cache key from an endpoint and its query parameters.
///
/// Parameters are sorted so the same request always yields the same key, and
/// any `api_key` parameter is left out.
pub fn cache_key(endpoint: &str, params: &[(&str, String)]) -> String {
    let mut pairs: Vec<_> = params
        .iter()
        .filter(|(k, _)| *k != "api_key")
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    pairs.sort();

    if pairs.is_empty() {
        endpoint.to_string()
    } else {
        format!("{endpoint}?{}", pairs.join("&"))
    }
}
