use std::time::Duration;

use reqwest::Url;

use crate::{
    error::{Result, SourceError},
    geo::Territory,
};

pub const DEFAULT_GAZETTEER_URL: &str = "https://ws.geonorge.no/stedsnavn/v1/sted";
pub const DEFAULT_ADDRESS_URL: &str = "https://ws.geonorge.no/adresser/v1/sok";
pub const DEFAULT_REVERSE_URL: &str = "https://ws.geonorge.no/stedsnavn/v1/punkt";

const ENV_GAZETTEER_URL: &str = "KARTSOK_GAZETTEER_URL";
const ENV_ADDRESS_URL: &str = "KARTSOK_ADDRESS_URL";
const ENV_REVERSE_URL: &str = "KARTSOK_REVERSE_URL";
const ENV_TIMEOUT_SECS: &str = "KARTSOK_TIMEOUT_SECS";

/// Descriptive user agent sent with every upstream request.
pub fn default_user_agent() -> String {
    format!(
        "kartsok/{} (outdoor map location search)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Parse an endpoint URL, naming the endpoint in the error.
pub fn parse_endpoint(name: &'static str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| SourceError::InvalidEndpoint {
        name,
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SourceError::InvalidEndpoint {
            name,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Endpoints, limits and timing for the upstream registries.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// Free-text place-name search endpoint
    pub gazetteer_url: Url,
    /// Address search endpoint
    pub address_url: Url,
    /// Point + radius place-name lookup endpoint
    pub reverse_url: Url,
    pub user_agent: String,
    /// Client-side deadline for a single upstream request
    pub request_timeout: Duration,
    /// Minimum spacing between consecutive gazetteer requests
    pub gazetteer_min_interval: Duration,
    /// Maximum number of gazetteer results kept per query
    pub gazetteer_limit: usize,
    /// Maximum number of address results kept per query
    pub address_limit: usize,
    /// `treffPerSide` requested from the text endpoints; over-fetches so that
    /// out-of-territory records can be discarded without starving the caps
    pub page_size: usize,
    pub reverse_radius_m: u32,
    pub reverse_max_candidates: usize,
    pub territory: Territory,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            gazetteer_url: Url::parse(DEFAULT_GAZETTEER_URL).expect("Default gazetteer URL"),
            address_url: Url::parse(DEFAULT_ADDRESS_URL).expect("Default address URL"),
            reverse_url: Url::parse(DEFAULT_REVERSE_URL).expect("Default reverse URL"),
            user_agent: default_user_agent(),
            request_timeout: Duration::from_secs(8),
            gazetteer_min_interval: Duration::from_secs(1),
            gazetteer_limit: 6,
            address_limit: 6,
            page_size: 10,
            reverse_radius_m: 1_000,
            reverse_max_candidates: 10,
            territory: Territory::NORWAY,
        }
    }
}

impl SourcesConfig {
    /// Apply `KARTSOK_*` environment overrides on top of this configuration.
    ///
    /// Recognized variables: `KARTSOK_GAZETTEER_URL`, `KARTSOK_ADDRESS_URL`,
    /// `KARTSOK_REVERSE_URL` and `KARTSOK_TIMEOUT_SECS`.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_GAZETTEER_URL) {
            self.gazetteer_url = parse_endpoint("gazetteer", &raw)?;
        }
        if let Some(raw) = lookup(ENV_ADDRESS_URL) {
            self.address_url = parse_endpoint("address registry", &raw)?;
        }
        if let Some(raw) = lookup(ENV_REVERSE_URL) {
            self.reverse_url = parse_endpoint("reverse lookup", &raw)?;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| SourceError::InvalidSetting {
                name: ENV_TIMEOUT_SECS,
                reason: format!("'{raw}' is not a whole number of seconds"),
            })?;
            self.request_timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }
}
