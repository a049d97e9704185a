//! Upstream location registries for the kartsok search engine.
//!
//! This crate owns everything that talks to the outside world: the shared
//! [`SearchResult`] model every source normalizes into, the HTTP transport seam
//! ([`Fetcher`]), the per-upstream [`RateLimiter`], and the three registry
//! clients:
//!
//! - [`GazetteerClient`]: free-text place-name search
//! - [`AddressClient`]: address search with a street-only and fuzzy fallback chain
//! - [`ReverseGeocoder`]: nearest named place for a coordinate
//!
//! Clients never surface upstream failures to their callers. Timeouts, non-2xx
//! responses and malformed payloads are logged and turned into "no results".

mod address;
mod config;
mod error;
mod fetch;
mod gazetteer;
mod geo;
mod rate_limit;
mod reverse;
mod types;

#[cfg(any(test, feature = "test_fetcher"))]
pub mod test_fetcher;

pub use address::{AddressClient, AddressQuery, fallback_chain};
pub use config::{
    DEFAULT_ADDRESS_URL, DEFAULT_GAZETTEER_URL, DEFAULT_REVERSE_URL, SourcesConfig,
    default_user_agent, parse_endpoint,
};
pub use error::{Result, SourceError};
pub use fetch::{Fetcher, HttpFetcher, Upstream};
pub use gazetteer::GazetteerClient;
pub use geo::{EARTH_RADIUS_M, Territory, haversine_distance_m};
pub use rate_limit::RateLimiter;
pub use reqwest::Url;
pub use reverse::{PLACE_TYPE_PRIORITY, ReverseGeocoder};
pub use types::{ResultKind, ResultSource, SearchResult};
