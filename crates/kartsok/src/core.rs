//! The federated search entry point.
//!
//! [`SearchOrchestrator`] turns free-form text into one ranked list of
//! locations. For every query that is not already cached it
//!
//! 1. tries to read the text as a coordinate,
//! 2. searches the caller's points of interest,
//! 3. queries the gazetteer and the address registry concurrently, together
//!    with a reverse lookup for a parsed coordinate,
//! 4. merges everything through the [`ResultAggregator`], and caches the list.
//!
//! ```rust,no_run
//! use kartsok::{PointOfInterest, SearchOrchestrator};
//!
//! # async fn run() -> kartsok::error::Result<()> {
//! let orchestrator = SearchOrchestrator::new()?;
//! let cabins = vec![PointOfInterest::new("1", "Kikutstua", 60.0539, 10.6453, "cabin")];
//!
//! for result in orchestrator.search("Kikut", &cabins).await {
//!     println!("{result}");
//! }
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Instant};

use kartsok_sources::{
    AddressClient, Fetcher, GazetteerClient, HttpFetcher, ReverseGeocoder, SearchResult,
};
use tracing::{debug, info, instrument};

use crate::{
    cache::ResultCache,
    config::SearchConfig,
    context::SearchContext,
    error::Result,
    search::{CoordinateParser, LocalIndexSearcher, PointOfInterest, ResultAggregator},
};

/// Sequences the parser, the local index and the upstream clients, and owns
/// access to the shared [`SearchContext`].
///
/// Cloning is cheap; clones share the context and the HTTP connection pool.
#[derive(Clone)]
pub struct SearchOrchestrator {
    config: Arc<SearchConfig>,
    context: Arc<SearchContext>,
    parser: CoordinateParser,
    local: LocalIndexSearcher,
    gazetteer: GazetteerClient,
    address: AddressClient,
    reverse: ReverseGeocoder,
    aggregator: ResultAggregator,
}

impl SearchOrchestrator {
    /// Orchestrator with the default configuration, a fresh context and a
    /// reqwest-backed transport.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> SearchOrchestratorBuilder {
        SearchOrchestratorBuilder::default()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub const fn context(&self) -> &Arc<SearchContext> {
        &self.context
    }

    /// Drop every cached result list.
    pub fn clear_cache(&self) {
        self.context.clear_cache();
    }

    /// Search every source for `text` and return one ranked, deduplicated list.
    ///
    /// Never fails. Upstreams that time out or misbehave contribute nothing,
    /// and the other sources are unaffected. Empty or whitespace-only text
    /// returns an empty list without touching the cache or the network.
    #[instrument(name = "Location Search", level = "info", skip_all, fields(query = %text.trim()))]
    pub async fn search(&self, text: &str, pois: &[PointOfInterest]) -> Vec<SearchResult> {
        let query = text.trim();
        if query.is_empty() {
            debug!("Empty query");
            return Vec::new();
        }
        let t_search = Instant::now();

        if let Some(results) = self.context.cache().get(query) {
            info!(
                elapsed = ?t_search.elapsed(),
                results = results.len(),
                "Served search from cache"
            );
            return results;
        }

        let normalized = ResultCache::normalize_key(query);
        let parsed = self.parser.parse(query);
        let local = self.local.search(&normalized, pois);

        // Reverse and text lookups hit the same gazetteer host and share its limiter
        let limiter = self.context.gazetteer_limiter();
        let nearby = async {
            match parsed {
                Some(coordinate) if self.config.reverse_geocode => {
                    self.reverse
                        .lookup(coordinate.lat, coordinate.lng, limiter)
                        .await
                }
                _ => None,
            }
        };
        let (nearby, gazetteer, addresses) = tokio::join!(
            nearby,
            self.gazetteer.search(query, limiter),
            self.address.search(query),
        );

        let coordinate: Vec<_> = parsed
            .map(|c| c.to_search_result(nearby.as_deref()))
            .into_iter()
            .collect();
        let counts = (coordinate.len(), local.len(), gazetteer.len(), addresses.len());

        let results = self
            .aggregator
            .merge([coordinate, local, gazetteer, addresses], &normalized);
        self.context.cache().put(query, results.clone());

        info!(
            elapsed = ?t_search.elapsed(),
            coordinates = counts.0,
            local = counts.1,
            gazetteer = counts.2,
            address = counts.3,
            results = results.len(),
            "Search complete"
        );
        results
    }
}

/// Builder for [`SearchOrchestrator`].
///
/// Anything not set falls back to a default: [`SearchConfig::default`], a new
/// [`SearchContext`] sized from the configuration, and an [`HttpFetcher`]
/// using the configured user agent and timeout.
#[derive(Default)]
pub struct SearchOrchestratorBuilder {
    config: Option<SearchConfig>,
    context: Option<Arc<SearchContext>>,
    fetcher: Option<Arc<dyn Fetcher>>,
}

impl SearchOrchestratorBuilder {
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a context (cache and rate limiter) with other orchestrators.
    pub fn context(mut self, context: Arc<SearchContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// Replace the HTTP transport.
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn build(self) -> Result<SearchOrchestrator> {
        let config = Arc::new(self.config.unwrap_or_default());
        let context = self
            .context
            .unwrap_or_else(|| Arc::new(SearchContext::from_config(&config)));
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(
                &config.sources.user_agent,
                config.sources.request_timeout,
            )?),
        };
        let sources = Arc::new(config.sources.clone());
        let territory = *config.territory();

        debug!(
            gazetteer = %sources.gazetteer_url,
            address = %sources.address_url,
            reverse = %sources.reverse_url,
            "Building search orchestrator"
        );

        Ok(SearchOrchestrator {
            parser: CoordinateParser::new(territory),
            local: LocalIndexSearcher::new(territory, config.local_limit),
            gazetteer: GazetteerClient::new(Arc::clone(&fetcher), Arc::clone(&sources)),
            address: AddressClient::new(Arc::clone(&fetcher), Arc::clone(&sources)),
            reverse: ReverseGeocoder::new(fetcher, sources),
            aggregator: ResultAggregator::new(config.dedup_distance_m, config.max_results),
            config,
            context,
        })
    }
}
