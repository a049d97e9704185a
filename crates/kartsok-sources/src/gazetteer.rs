use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    config::SourcesConfig,
    error::Result,
    fetch::{Fetcher, Upstream, decode_records, fetch_json},
    geo::Territory,
    rate_limit::RateLimiter,
    types::{ResultKind, ResultSource, SearchResult},
};

/// Body of both the text and the point endpoints of the place-name registry.
#[derive(Debug, Deserialize)]
pub struct NameResponse {
    #[serde(default)]
    pub navn: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Spelling {
    #[serde(rename = "skrivemåte")]
    spelling: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Point {
    nord: Option<f64>,
    #[serde(rename = "øst")]
    east: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Municipality {
    #[serde(rename = "kommunenavn")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct County {
    #[serde(rename = "fylkesnavn")]
    name: Option<String>,
}

/// One named place as returned by the gazetteer.
///
/// The text endpoint nests spellings under `stedsnavn`, the point endpoint
/// carries `skrivemåte` at the top level; both are accepted.
#[derive(Debug, Deserialize)]
pub struct NameRecord {
    #[serde(rename = "skrivemåte")]
    spelling: Option<String>,
    #[serde(default)]
    stedsnavn: Vec<Spelling>,
    #[serde(rename = "navneobjekttype")]
    object_type: Option<String>,
    #[serde(rename = "stedsnummer")]
    place_number: Option<u64>,
    #[serde(rename = "representasjonspunkt")]
    point: Option<Point>,
    #[serde(default, rename = "kommuner")]
    municipalities: Vec<Municipality>,
    #[serde(default, rename = "fylker")]
    counties: Vec<County>,
}

impl NameRecord {
    pub fn name(&self) -> Option<&str> {
        self.spelling
            .as_deref()
            .or_else(|| self.stedsnavn.iter().find_map(|s| s.spelling.as_deref()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    fn coordinate(&self) -> Option<(f64, f64)> {
        let point = self.point.as_ref()?;
        Some((point.nord?, point.east?))
    }

    fn municipality(&self) -> Option<&str> {
        self.municipalities.iter().find_map(|m| m.name.as_deref())
    }

    fn county(&self) -> Option<&str> {
        self.counties.iter().find_map(|c| c.name.as_deref())
    }

    /// Normalize into a [`SearchResult`], or `None` if the record has no usable
    /// name or geometry or lies outside `territory`.
    fn to_result(&self, territory: &Territory) -> Option<SearchResult> {
        let Some(name) = self.name() else {
            debug!("Dropping gazetteer record without a name");
            return None;
        };
        let Some((lat, lng)) = self.coordinate() else {
            debug!(name, "Dropping gazetteer record without representasjonspunkt");
            return None;
        };
        if !territory.contains(lat, lng) {
            debug!(name, lat, lng, "Dropping gazetteer record outside territory");
            return None;
        }

        let display_name = match self.municipality().or_else(|| self.county()) {
            Some(admin) => format!("{name}, {admin}"),
            None => name.to_string(),
        };
        let id = self.place_number.map_or_else(
            || format!("gazetteer:{name}@{lat:.5},{lng:.5}"),
            |number| format!("gazetteer:{number}"),
        );

        let mut result = SearchResult::new(
            id,
            name,
            display_name,
            lat,
            lng,
            ResultKind::Place,
            ResultSource::Gazetteer,
        );
        if let Some(object_type) = self.object_type() {
            result = result.with_description(object_type);
        }
        if let Some(municipality) = self.municipality() {
            result = result.with_municipality(municipality);
        }
        if let Some(county) = self.county() {
            result = result.with_county(county);
        }
        Some(result)
    }
}

/// Free-text client for the place-name registry.
#[derive(Clone)]
pub struct GazetteerClient {
    fetcher: Arc<dyn Fetcher>,
    config: Arc<SourcesConfig>,
}

impl GazetteerClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Arc<SourcesConfig>) -> Self {
        Self { fetcher, config }
    }

    /// Search place names starting with `query`.
    ///
    /// Waits on `limiter` before the request goes out. Never fails: timeouts and
    /// upstream errors are logged and yield an empty list.
    #[instrument(name = "Gazetteer search", level = "debug", skip(self, limiter))]
    pub async fn search(&self, query: &str, limiter: &RateLimiter) -> Vec<SearchResult> {
        limiter.wait().await;
        match self.try_search(query).await {
            Ok(results) => {
                debug!(count = results.len(), "Gazetteer search complete");
                results
            }
            Err(e) => {
                warn!(error = %e, "Gazetteer search failed; continuing without its results");
                Vec::new()
            }
        }
    }

    /// Single gazetteer request without rate limiting or error recovery.
    pub async fn try_search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut url = self.config.gazetteer_url.clone();
        url.query_pairs_mut()
            .append_pair("sok", &format!("{query}*"))
            .append_pair("treffPerSide", &self.config.page_size.to_string())
            .append_pair("side", "1");

        let response: NameResponse = fetch_json(
            self.fetcher.as_ref(),
            Upstream::Gazetteer,
            url,
            self.config.request_timeout,
        )
        .await?;

        let territory = self.config.territory;
        Ok(decode_records::<NameRecord>(Upstream::Gazetteer, response.navn)
            .filter_map(|record| record.to_result(&territory))
            .take(self.config.gazetteer_limit)
            .collect())
    }
}
