use std::time::Duration;

use kartsok_sources::RateLimiter;

use crate::{cache::ResultCache, config::SearchConfig};

/// Per-application search state: the result cache and the gazetteer rate limiter.
///
/// Shared (as `Arc<SearchContext>`) by every orchestrator that should see the
/// same cache and respect the same request spacing.
#[derive(Debug)]
pub struct SearchContext {
    cache: ResultCache,
    gazetteer_limiter: RateLimiter,
}

impl SearchContext {
    pub fn new(cache_ttl: Duration, gazetteer_min_interval: Duration) -> Self {
        Self {
            cache: ResultCache::new(cache_ttl),
            gazetteer_limiter: RateLimiter::new(gazetteer_min_interval),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            cache: ResultCache::with_capacity(config.cache_ttl, config.cache_capacity),
            gazetteer_limiter: RateLimiter::new(config.sources.gazetteer_min_interval),
        }
    }

    pub const fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub const fn gazetteer_limiter(&self) -> &RateLimiter {
        &self.gazetteer_limiter
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}
