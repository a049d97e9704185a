use std::sync::Arc;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::{
    config::SourcesConfig,
    error::Result,
    fetch::{Fetcher, Upstream, decode_records, fetch_json},
    geo::Territory,
    types::{ResultKind, ResultSource, SearchResult},
};

/// `<street name> <house number>[letter]`, e.g. `Storgata 12B`.
static STREET_AND_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<street>.*\p{L}.*?)\s+\d+\s*\p{L}?$").expect("Street/number pattern")
});

/// One request in the address fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub text: String,
    pub fuzzy: bool,
}

/// Requests to try, in order, for `query`:
/// the query as given, the street name alone when the query ends in a house
/// number, and finally the query again with fuzzy matching.
pub fn fallback_chain(query: &str) -> Vec<AddressQuery> {
    let query = query.trim();
    let mut chain = vec![AddressQuery {
        text: query.to_string(),
        fuzzy: false,
    }];
    if let Some(street) = STREET_AND_NUMBER
        .captures(query)
        .and_then(|caps| caps.name("street"))
    {
        chain.push(AddressQuery {
            text: street.as_str().trim().to_string(),
            fuzzy: false,
        });
    }
    chain.push(AddressQuery {
        text: query.to_string(),
        fuzzy: true,
    });
    chain
}

#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(default)]
    adresser: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AddressRecord {
    #[serde(rename = "adressetekst")]
    text: Option<String>,
    #[serde(rename = "kommunenavn")]
    municipality: Option<String>,
    #[serde(rename = "kommunenummer")]
    municipality_number: Option<String>,
    #[serde(rename = "postnummer")]
    postcode: Option<String>,
    #[serde(rename = "poststed")]
    post_town: Option<String>,
    #[serde(rename = "representasjonspunkt")]
    point: Option<LatLon>,
}

impl AddressRecord {
    fn to_result(&self, territory: &Territory) -> Option<SearchResult> {
        let Some(text) = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            debug!("Dropping address record without adressetekst");
            return None;
        };
        let Some((lat, lng)) = self.point.as_ref().and_then(|p| Some((p.lat?, p.lon?))) else {
            debug!(text, "Dropping address record without representasjonspunkt");
            return None;
        };
        if !territory.contains(lat, lng) {
            debug!(text, lat, lng, "Dropping address record outside territory");
            return None;
        }

        let municipality = self.municipality.as_deref().map(proper_case);
        let locality = match (self.postcode.as_deref(), self.post_town.as_deref()) {
            (Some(code), Some(town)) => Some(format!("{code} {}", proper_case(town))),
            _ => municipality.clone(),
        };
        let display_name = std::iter::once(text.to_string())
            .chain(locality)
            .join(", ");
        let scope = self
            .municipality_number
            .as_deref()
            .or(self.postcode.as_deref())
            .unwrap_or("-");

        let mut result = SearchResult::new(
            format!("address:{scope}:{}", text.to_lowercase()),
            text,
            display_name,
            lat,
            lng,
            ResultKind::Address,
            ResultSource::AddressRegistry,
        );
        if let Some(municipality) = municipality {
            result = result.with_municipality(municipality);
        }
        Some(result)
    }
}

/// The address registry returns municipality and post town names in capitals.
fn proper_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    for c in raw.trim().chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_word_start = c.is_whitespace() || c == '-';
    }
    out
}

/// Client for the address registry.
#[derive(Clone)]
pub struct AddressClient {
    fetcher: Arc<dyn Fetcher>,
    config: Arc<SourcesConfig>,
}

impl AddressClient {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: Arc<SourcesConfig>) -> Self {
        Self { fetcher, config }
    }

    /// Search addresses, walking the [`fallback_chain`] until an attempt yields
    /// at least one result.
    ///
    /// Each attempt has its own deadline, and a failed attempt moves on to the
    /// next one. Never fails: an exhausted chain yields an empty list.
    #[instrument(name = "Address search", level = "debug", skip(self))]
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        for (attempt, request) in fallback_chain(query).iter().enumerate() {
            match self.try_search(request).await {
                Ok(results) if !results.is_empty() => {
                    debug!(
                        attempt,
                        text = %request.text,
                        fuzzy = request.fuzzy,
                        count = results.len(),
                        "Address search complete"
                    );
                    return results;
                }
                Ok(_) => {
                    debug!(attempt, text = %request.text, fuzzy = request.fuzzy, "No addresses");
                }
                Err(e) => {
                    warn!(
                        attempt,
                        text = %request.text,
                        fuzzy = request.fuzzy,
                        error = %e,
                        "Address attempt failed; trying next fallback"
                    );
                }
            }
        }
        Vec::new()
    }

    /// Single address registry request without fallbacks or error recovery.
    pub async fn try_search(&self, request: &AddressQuery) -> Result<Vec<SearchResult>> {
        let mut url = self.config.address_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("sok", &request.text)
                .append_pair("treffPerSide", &self.config.page_size.to_string())
                .append_pair("side", "1");
            if request.fuzzy {
                pairs.append_pair("fuzzy", "true");
            }
        }

        let response: AddressResponse = fetch_json(
            self.fetcher.as_ref(),
            Upstream::AddressRegistry,
            url,
            self.config.request_timeout,
        )
        .await?;

        let territory = self.config.territory;
        Ok(
            decode_records::<AddressRecord>(Upstream::AddressRegistry, response.adresser)
                .filter_map(|record| record.to_result(&territory))
                .take(self.config.address_limit)
                .collect(),
        )
    }
}
