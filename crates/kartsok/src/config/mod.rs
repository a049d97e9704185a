use std::time::Duration;

use kartsok_sources::{SourcesConfig, Territory, Url};

use crate::error::{KartsokError, Result};

/// Everything the [`SearchOrchestrator`](crate::SearchOrchestrator) needs to know
/// about limits, timing and upstreams.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Upstream endpoints, timeouts and per-source caps
    pub sources: SourcesConfig,
    /// How long a cached result list is served
    pub cache_ttl: Duration,
    /// Upper bound on the number of cached queries
    pub cache_capacity: u64,
    /// Results closer than this are treated as the same location
    pub dedup_distance_m: f64,
    /// Maximum length of the final ranked list
    pub max_results: usize,
    /// Maximum number of local point-of-interest matches
    pub local_limit: usize,
    /// Enrich parsed coordinates with the name of a nearby place
    pub reverse_geocode: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            cache_ttl: Duration::from_secs(5 * 60),
            cache_capacity: 10_000,
            dedup_distance_m: 500.0,
            max_results: 12,
            local_limit: 5,
            reverse_geocode: true,
        }
    }
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::new()
    }

    pub const fn territory(&self) -> &Territory {
        &self.sources.territory
    }
}

/// Builder for creating search configurations with ergonomic defaults
#[derive(Debug, Clone, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Create a new builder with the reference defaults
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    /// Create a builder starting from the defaults with `KARTSOK_*` environment
    /// overrides applied to the upstream configuration
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::new();
        builder.config.sources = builder.config.sources.with_env_overrides()?;
        Ok(builder)
    }

    /// Create a builder that never enriches coordinates with a reverse lookup,
    /// so a coordinate query issues no request beyond the text searches
    pub fn offline() -> Self {
        Self::new().reverse_geocode(false)
    }

    /// Replace the upstream configuration wholesale
    pub fn sources(mut self, sources: SourcesConfig) -> Self {
        self.config.sources = sources;
        self
    }

    pub fn gazetteer_url(mut self, url: Url) -> Self {
        self.config.sources.gazetteer_url = url;
        self
    }

    pub fn address_url(mut self, url: Url) -> Self {
        self.config.sources.address_url = url;
        self
    }

    pub fn reverse_url(mut self, url: Url) -> Self {
        self.config.sources.reverse_url = url;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.sources.user_agent = user_agent.into();
        self
    }

    /// Set the deadline applied to every upstream request
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.sources.request_timeout = timeout;
        self
    }

    /// Set the minimum spacing between gazetteer requests
    pub const fn gazetteer_interval(mut self, interval: Duration) -> Self {
        self.config.sources.gazetteer_min_interval = interval;
        self
    }

    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub const fn cache_capacity(mut self, capacity: u64) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub const fn dedup_distance(mut self, meters: f64) -> Self {
        self.config.dedup_distance_m = meters;
        self
    }

    /// Set the maximum number of results to return
    pub const fn limit(mut self, limit: usize) -> Self {
        self.config.max_results = limit;
        self
    }

    /// Set the per-source caps (local index, gazetteer, address registry)
    pub const fn source_limits(mut self, local: usize, gazetteer: usize, address: usize) -> Self {
        self.config.local_limit = local;
        self.config.sources.gazetteer_limit = gazetteer;
        self.config.sources.address_limit = address;
        self
    }

    pub const fn reverse_geocode(mut self, enabled: bool) -> Self {
        self.config.reverse_geocode = enabled;
        self
    }

    /// Set the reverse lookup search radius and number of candidates considered
    pub const fn reverse_lookup(mut self, radius_m: u32, max_candidates: usize) -> Self {
        self.config.sources.reverse_radius_m = radius_m;
        self.config.sources.reverse_max_candidates = max_candidates;
        self
    }

    /// Restrict results to a bounding box other than mainland Norway
    pub const fn territory(mut self, territory: Territory) -> Self {
        self.config.sources.territory = territory;
        self
    }

    /// Build the final configuration without validation
    pub fn build(self) -> SearchConfig {
        self.config
    }

    /// Build the final configuration, rejecting values the engine cannot work with
    pub fn try_build(self) -> Result<SearchConfig> {
        let config = self.config;
        let sources = &config.sources;

        let caps = [
            ("max_results", config.max_results),
            ("local_limit", config.local_limit),
            ("gazetteer_limit", sources.gazetteer_limit),
            ("address_limit", sources.address_limit),
            ("page_size", sources.page_size),
            (
                "cache_capacity",
                usize::try_from(config.cache_capacity).unwrap_or(usize::MAX),
            ),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, value)| *value == 0) {
            return Err(KartsokError::ConfigError(format!(
                "{name} must be greater than zero"
            )));
        }

        let durations = [
            ("cache_ttl", config.cache_ttl),
            ("request_timeout", sources.request_timeout),
            ("gazetteer_min_interval", sources.gazetteer_min_interval),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| value.is_zero()) {
            return Err(KartsokError::ConfigError(format!(
                "{name} must be greater than zero"
            )));
        }

        if !(config.dedup_distance_m.is_finite() && config.dedup_distance_m >= 0.0) {
            return Err(KartsokError::ConfigError(format!(
                "dedup distance must be a non-negative number of meters, got {}",
                config.dedup_distance_m
            )));
        }

        if !sources.territory.is_valid() {
            return Err(KartsokError::ConfigError(format!(
                "territory must satisfy west < east and south < north, got {:?}",
                sources.territory.as_array()
            )));
        }

        Ok(config)
    }
}
