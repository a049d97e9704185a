use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    config::SourcesConfig,
    error::Result,
    fetch::{Fetcher, Upstream, decode_records, fetch_json},
    gazetteer::{NameRecord, NameResponse},
    rate_limit::RateLimiter,
};

/// Place-object types preferred when several names surround a point, best first:
/// populated places, then natural features. Anything else is generic and only
/// chosen by falling back to the first candidate.
pub const PLACE_TYPE_PRIORITY: &[&str] = &[
    "By",
    "Tettsted",
    "Tettbebyggelse",
    "Bygd",
    "Grend",
    "Boligfelt",
    "Fjell",
    "Topp",
    "Høyde",
    "Ås",
    "Innsjø",
    "Vann",
    "Tjern",
    "Øy",
    "Fjord",
    "Dal",
    "Bre",
];

/// Finds a display name for a coordinate by asking the gazetteer what is nearby.
#[derive(Clone)]
pub struct ReverseGeocoder {
    fetcher: Arc<dyn Fetcher>,
    config: Arc<SourcesConfig>,
}

impl ReverseGeocoder {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Arc<SourcesConfig>) -> Self {
        Self { fetcher, config }
    }

    /// Name of the most relevant place near (`lat`, `lng`), if any.
    ///
    /// The point endpoint lives on the gazetteer host, so the request waits on
    /// the gazetteer's `limiter`. Best-effort: failures are logged at debug
    /// level and reported as `None`.
    #[instrument(name = "Reverse lookup", level = "debug", skip(self, limiter))]
    pub async fn lookup(&self, lat: f64, lng: f64, limiter: &RateLimiter) -> Option<String> {
        limiter.wait().await;
        match self.try_lookup(lat, lng).await {
            Ok(name) => name,
            Err(e) => {
                debug!(error = %e, "Reverse lookup failed");
                None
            }
        }
    }

    pub async fn try_lookup(&self, lat: f64, lng: f64) -> Result<Option<String>> {
        let mut url = self.config.reverse_url.clone();
        url.query_pairs_mut()
            .append_pair("nord", &lat.to_string())
            .append_pair("ost", &lng.to_string())
            .append_pair("radius", &self.config.reverse_radius_m.to_string())
            .append_pair("maxAnt", &self.config.reverse_max_candidates.to_string());

        let response: NameResponse = fetch_json(
            self.fetcher.as_ref(),
            Upstream::ReverseLookup,
            url,
            self.config.request_timeout,
        )
        .await?;

        let candidates: Vec<NameRecord> =
            decode_records(Upstream::ReverseLookup, response.navn).collect();
        Ok(select_candidate(&candidates).map(str::to_string))
    }
}

/// First candidate of the highest-priority type, else the first named candidate.
fn select_candidate(candidates: &[NameRecord]) -> Option<&str> {
    PLACE_TYPE_PRIORITY
        .iter()
        .find_map(|wanted| {
            candidates.iter().find(|c| {
                c.name().is_some()
                    && c.object_type()
                        .is_some_and(|t| t.eq_ignore_ascii_case(wanted))
            })
        })
        .or_else(|| candidates.iter().find(|c| c.name().is_some()))
        .and_then(NameRecord::name)
}
