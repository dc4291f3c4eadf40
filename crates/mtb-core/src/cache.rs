//! Time-bounded caches for GitHub listings.
//!
//! Both caches use double-checked locking: a read-locked fast path, then a
//! write-locked re-check before fetching, so concurrent misses trigger one
//! upstream call. A failed fetch leaves the cache untouched.

use std::{
    collections::HashMap,
    future::Future,
    hash::Hash,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use tracing::debug;

use crate::Result;

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    payload: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(payload: T) -> Self {
        Self {
            payload,
            fetched_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Single-slot cache, used for the release list.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    /// Payloads failing this check are refetched regardless of age.
    usable: fn(&T) -> bool,
    slot: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_check(ttl, |_| true)
    }

    pub fn with_check(ttl: Duration, usable: fn(&T) -> bool) -> Self {
        Self {
            ttl,
            usable,
            slot: RwLock::new(None),
        }
    }

    fn hit(&self, slot: &Option<CacheEntry<T>>) -> Option<T> {
        slot.as_ref()
            .filter(|e| e.is_fresh(self.ttl) && (self.usable)(&e.payload))
            .map(|e| e.payload.clone())
    }

    /// Fresh cached payload, or the result of `fetch` stored for next time.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(payload) = self.hit(&*self.slot.read().await) {
            return Ok(payload);
        }

        let mut slot = self.slot.write().await;
        if let Some(payload) = self.hit(&slot) {
            return Ok(payload);
        }

        debug!("cache miss, fetching");
        let payload = fetch().await?;
        *slot = Some(CacheEntry::new(payload.clone()));
        Ok(payload)
    }

    /// Cached payload regardless of age.
    pub async fn peek(&self) -> Option<T> {
        self.slot.read().await.as_ref().map(|e| e.payload.clone())
    }

    #[cfg(test)]
    async fn backdate(&self, by: Duration) {
        if let Some(entry) = self.slot.write().await.as_mut() {
            if let Some(at) = entry.fetched_at.checked_sub(by) {
                entry.fetched_at = at;
            }
        }
    }
}

/// Per-key cache, used for version comparisons.
#[derive(Debug)]
pub struct KeyedTtlCache<K, T> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<T>>>,
}

impl<K, T> KeyedTtlCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_or_fetch<F, Fut>(&self, key: &K, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key).filter(|e| e.is_fresh(self.ttl)) {
                return Ok(entry.payload.clone());
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(key).filter(|e| e.is_fresh(self.ttl)) {
            return Ok(entry.payload.clone());
        }

        let payload = fetch().await?;
        entries.insert(key.clone(), CacheEntry::new(payload.clone()));
        Ok(payload)
    }

    pub async fn peek(&self, key: &K) -> Option<T> {
        self.entries.read().await.get(key).map(|e| e.payload.clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    #[cfg(test)]
    async fn backdate(&self, key: &K, by: Duration) {
        if let Some(entry) = self.entries.write().await.get_mut(key) {
            if let Some(at) = entry.fetched_at.checked_sub(by) {
                entry.fetched_at = at;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn concurrent_misses_fetch_once() {
        let cache = Arc::new(TtlCache::<Vec<String>>::new(HOUR));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(|| async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok(vec!["v2.6.0".to_string()])
                    })
                    .await
            }));
        }
        for t in tasks {
            assert_eq!(t.await.unwrap().unwrap(), vec!["v2.6.0".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let cache = TtlCache::new(HOUR);
        let first = cache.get_or_fetch(|| async { Ok(1u32) }).await.unwrap();
        assert_eq!(first, 1);

        let cached = cache.get_or_fetch(|| async { Ok(2u32) }).await.unwrap();
        assert_eq!(cached, 1);

        cache.backdate(HOUR + Duration::from_secs(1)).await;
        let refreshed = cache.get_or_fetch(|| async { Ok(3u32) }).await.unwrap();
        assert_eq!(refreshed, 3);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_payload() {
        let cache = TtlCache::new(HOUR);
        cache.get_or_fetch(|| async { Ok("old") }).await.unwrap();
        cache.backdate(HOUR * 2).await;

        let err = cache
            .get_or_fetch(|| async { Err(Error::External("boom".into())) })
            .await;
        assert!(err.is_err());
        assert_eq!(cache.peek().await, Some("old"));
    }

    #[tokio::test]
    async fn failed_fetch_on_empty_cache_stores_nothing() {
        let cache: TtlCache<u8> = TtlCache::new(HOUR);
        let res = cache
            .get_or_fetch(|| async { Err(Error::External("down".into())) })
            .await;
        assert!(res.is_err());
        assert_eq!(cache.peek().await, None);
    }

    #[tokio::test]
    async fn empty_listing_is_fetched_again() {
        let cache = TtlCache::<Vec<u8>>::with_check(HOUR, |v| !v.is_empty());
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let got = cache
                .get_or_fetch(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Vec::new())
                })
                .await
                .unwrap();
            assert!(got.is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.get_or_fetch(|| async { Ok(vec![1]) }).await.unwrap();
        let cached = cache.get_or_fetch(|| async { Ok(vec![2]) }).await.unwrap();
        assert_eq!(cached, vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn keyed_entries_are_independent() {
        let cache = KeyedTtlCache::new(HOUR);
        let a = cache
            .get_or_fetch(&"v1...v2".to_string(), || async { Ok("a") })
            .await
            .unwrap();
        let b = cache
            .get_or_fetch(&"v2...v3".to_string(), || async { Ok("b") })
            .await
            .unwrap();
        assert_eq!((a, b), ("a", "b"));
        assert_eq!(cache.len().await, 2);

        let again = cache
            .get_or_fetch(&"v1...v2".to_string(), || async { Ok("x") })
            .await
            .unwrap();
        assert_eq!(again, "a");
    }

    #[tokio::test]
    async fn keyed_expiry_and_failure() {
        let cache = KeyedTtlCache::new(HOUR);
        let key = "a...b".to_string();
        cache.get_or_fetch(&key, || async { Ok(1u8) }).await.unwrap();
        cache.backdate(&key, HOUR).await;

        let res = cache
            .get_or_fetch(&key, || async { Err(Error::External("x".into())) })
            .await;
        assert!(res.is_err());
        assert_eq!(cache.peek(&key).await, Some(1));

        let fresh = cache.get_or_fetch(&key, || async { Ok(2u8) }).await.unwrap();
        assert_eq!(fresh, 2);
    }

    #[tokio::test]
    async fn keyed_concurrent_misses_fetch_once_per_key() {
        let cache = Arc::new(KeyedTtlCache::<String, u32>::new(HOUR));
        let calls = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for i in 0..12 {
            let cache = cache.clone();
            let calls = calls.clone();
            tasks.push(tokio::spawn(async move {
                let key = if i % 2 == 0 { "even" } else { "odd" }.to_string();
                cache
                    .get_or_fetch(&key, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Ok(7)
                    })
                    .await
            }));
        }
        for t in tasks {
            assert_eq!(t.await.unwrap().unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
