//! Mutex-guarded cache wrappers shared across request tasks.
//!
//! The LRU itself is not safe for concurrent use; each wrapper holds one
//! mutex across a single map operation, never nesting locks.

use crate::cache::sizedlru::SizedLru;
use crate::services::modify::Stub;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Generic mutexed LRU with a fixed time-to-live for every entry.
pub struct LockedCache<V: Clone> {
    lru: Mutex<SizedLru<V>>,
    ttl: Duration,
}

impl<V: Clone> LockedCache<V> {
    #[must_use]
    pub fn new(max_size: u64, ttl: Duration) -> Self {
        Self {
            lru: Mutex::new(SizedLru::new(max_size)),
            ttl,
        }
    }

    pub fn add(&self, key: &str, value: V, size: u64) {
        let mut lru = self.lru.lock().expect("cache mutex poisoned");
        lru.add(key, value, size, Instant::now() + self.ttl);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut lru = self.lru.lock().expect("cache mutex poisoned");
        lru.get(key).cloned()
    }
}

/// Cache of fetched installer stubs, keyed by upstream URL.
pub struct StubCache {
    cache: LockedCache<Stub>,
}

impl StubCache {
    #[must_use]
    pub fn new(max_size: u64, ttl: Duration) -> Self {
        Self {
            cache: LockedCache::new(max_size, ttl),
        }
    }

    pub fn add(&self, key: &str, stub: &Stub) {
        let size = (stub.body.len() + stub.content_type.len()) as u64;
        self.cache.add(key, stub.clone(), size);
    }

    /// Returns a copy so the cached original is never mutated by a patcher.
    pub fn get(&self, key: &str) -> Option<Stub> {
        self.cache.get(key)
    }
}

/// Cache of resolved redirect locations, keyed by bouncer URL.
pub struct StringCache {
    cache: LockedCache<String>,
}

impl StringCache {
    #[must_use]
    pub fn new(max_size: u64, ttl: Duration) -> Self {
        Self {
            cache: LockedCache::new(max_size, ttl),
        }
    }

    pub fn add(&self, key: &str, value: &str) {
        self.cache.add(key, value.to_string(), value.len() as u64);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_cache_roundtrip() {
        let cache = StringCache::new(1024, Duration::from_secs(60));
        assert_eq!(cache.get("k"), None);
        cache.add("k", "https://cdn.example/installer.exe");
        assert_eq!(
            cache.get("k").as_deref(),
            Some("https://cdn.example/installer.exe")
        );
    }

    #[test]
    fn string_cache_expiry() {
        let cache = StringCache::new(1024, Duration::from_secs(0));
        cache.add("k", "v");
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn stub_cache_returns_independent_copies() {
        let cache = StubCache::new(1024, Duration::from_secs(60));
        let stub = Stub {
            body: vec![1, 2, 3],
            content_type: "application/octet-stream".to_string(),
            filename: "stub.exe".to_string(),
        };
        cache.add("k", &stub);

        let mut first = cache.get("k").unwrap();
        first.body[0] = 0xFF;
        let second = cache.get("k").unwrap();
        assert_eq!(second.body, vec![1, 2, 3]);
    }
}
