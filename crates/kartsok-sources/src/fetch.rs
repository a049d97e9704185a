use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, Url,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Result, SourceError};

/// The upstream registries this crate talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    Gazetteer,
    AddressRegistry,
    ReverseLookup,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Gazetteer => "gazetteer",
            Self::AddressRegistry => "address registry",
            Self::ReverseLookup => "reverse lookup",
        };
        f.write_str(label)
    }
}

/// Transport used by the registry clients.
///
/// Implementations return the response body of a successful (2xx) `GET`, or an
/// error. Deadlines are enforced by the callers, not by the fetcher.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get_text(&self, upstream: Upstream, url: Url) -> Result<String>;
}

/// [`Fetcher`] backed by a shared `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client that identifies itself with `user_agent`, asks for JSON and
    /// gives up on any request after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(name = "HTTP GET", level = "debug", skip_all, fields(%upstream, %url))]
    async fn get_text(&self, upstream: Upstream, url: Url) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                upstream,
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Fetch `url` under a client-side deadline and decode the JSON body.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn Fetcher,
    upstream: Upstream,
    url: Url,
    timeout: Duration,
) -> Result<T> {
    let t_start = tokio::time::Instant::now();
    let body = tokio::time::timeout(timeout, fetcher.get_text(upstream, url))
        .await
        .map_err(|_| SourceError::Timeout {
            upstream,
            after: timeout,
        })??;
    debug!(
        %upstream,
        elapsed = ?t_start.elapsed(),
        bytes = body.len(),
        "Upstream response received"
    );
    Ok(serde_json::from_str(&body)?)
}

/// Decode each element of a JSON array on its own so one malformed record does
/// not take its siblings down with it.
pub fn decode_records<T: DeserializeOwned>(
    upstream: Upstream,
    records: Vec<serde_json::Value>,
) -> impl Iterator<Item = T> {
    records
        .into_iter()
        .enumerate()
        .filter_map(move |(idx, raw)| match serde_json::from_value(raw) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(%upstream, idx, error = %e, "Dropping malformed record");
                None
            }
        })
}
