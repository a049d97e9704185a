use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use ahash::RandomState;
use kartsok_sources::SearchResult;
use moka::sync::Cache;
use tokio::time::Instant;
use tracing::debug;

/// Number of queries kept when no capacity is given.
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// A cached result list for one normalized query.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub results: Vec<SearchResult>,
    pub inserted_at: Instant,
}

/// Query results kept for a fixed time to live, in memory only.
///
/// Backed by a bounded `moka` cache. Expiry is also checked against the tokio
/// clock, so an entry is never served past its time to live even when the
/// runtime clock is paused or advanced. Entries expired by that clock are
/// swept on insert at most once per time to live.
#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: Cache<String, Arc<CacheEntry>, RandomState>,
    last_sweep: Mutex<Instant>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        Self {
            ttl,
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build_with_hasher(RandomState::new()),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> u64 {
        self.entries.policy().max_capacity().unwrap_or(u64::MAX)
    }

    /// Cache key for raw query text: trimmed and lower-cased.
    pub fn normalize_key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    pub fn get(&self, query: &str) -> Option<Vec<SearchResult>> {
        let key = Self::normalize_key(query);
        let entry = self.entries.get(&key)?;
        if self.is_expired(&entry) {
            debug!(%key, "Cache entry expired");
            self.entries.invalidate(&key);
            return None;
        }
        debug!(%key, count = entry.results.len(), "Cache hit");
        Some(entry.results.clone())
    }

    pub fn put(&self, query: &str, results: Vec<SearchResult>) {
        self.sweep_expired();
        let key = Self::normalize_key(query);
        let entry = CacheEntry {
            key: key.clone(),
            results,
            inserted_at: Instant::now(),
        };
        self.entries.insert(key, Arc::new(entry));
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Number of stored entries. Expired entries count until they are read or
    /// swept.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().next().is_none()
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.inserted_at.elapsed() > self.ttl
    }

    fn sweep_expired(&self) {
        {
            let mut last_sweep = self
                .last_sweep
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if last_sweep.elapsed() < self.ttl {
                return;
            }
            *last_sweep = Instant::now();
        }

        let expired: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry))
            .map(|(key, _)| key)
            .collect();
        for key in &expired {
            self.entries.invalidate(key.as_str());
        }
        if !expired.is_empty() {
            debug!(count = expired.len(), "Swept expired cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use kartsok_sources::{ResultKind, ResultSource};

    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn oslo() -> Vec<SearchResult> {
        vec![SearchResult::new(
            "gazetteer:1",
            "Oslo",
            "Oslo",
            59.91,
            10.75,
            ResultKind::Place,
            ResultSource::Gazetteer,
        )]
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_is_normalized() {
        let cache = ResultCache::new(TTL);
        cache.put("  OSLO ", oslo());
        assert_eq!(cache.get("oslo").unwrap()[0].name, "Oslo");
        assert_eq!(cache.get("Oslo\t").unwrap().len(), 1);
        assert!(cache.get("bergen").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_served_until_ttl() {
        let cache = ResultCache::new(TTL);
        cache.put("oslo", oslo());

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert!(cache.get("oslo").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent_and_removed() {
        let cache = ResultCache::new(TTL);
        cache.put("oslo", oslo());

        tokio::time::advance(TTL + Duration::from_millis(1)).await;
        assert_eq!(cache.len(), 1);
        assert!(cache.get("oslo").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restarts_ttl() {
        let cache = ResultCache::new(TTL);
        cache.put("oslo", Vec::new());
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.put("oslo", oslo());
        tokio::time::advance(Duration::from_secs(200)).await;

        assert_eq!(cache.get("oslo").map(|r| r.len()), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_do_not_accumulate() {
        let cache = ResultCache::new(TTL);
        for i in 0..1000 {
            cache.put(&format!("query {i}"), Vec::new());
        }
        assert_eq!(cache.len(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        cache.put("fresh", oslo());

        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
        assert!(cache.get("query 0").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_live_entries() {
        let cache = ResultCache::new(TTL);
        cache.put("old", Vec::new());
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.put("recent", oslo());
        tokio::time::advance(Duration::from_secs(200)).await;

        cache.put("new", oslo());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("recent").is_some());
        assert!(cache.get("old").is_none());
    }

    #[tokio::test]
    async fn test_capacity_bounds_entries() {
        let cache = ResultCache::with_capacity(TTL, 10);
        for i in 0..100 {
            cache.put(&format!("query {i}"), Vec::new());
        }
        cache.entries.run_pending_tasks();

        assert_eq!(cache.capacity(), 10);
        assert!(cache.len() <= 10, "got {}", cache.len());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ResultCache::new(TTL);
        cache.put("oslo", oslo());
        cache.put("bergen", Vec::new());
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("oslo").is_none());
    }
}
