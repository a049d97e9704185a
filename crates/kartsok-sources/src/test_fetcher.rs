//! Scripted [`Fetcher`] for exercising the registry clients without a network.
//!
//! Routes are matched in registration order against the requested URL; the first
//! match decides the reply. Unrouted requests answer `404`. Every request is
//! recorded so tests can assert on what was sent upstream.
//!
//! ```rust
//! use std::time::Duration;
//! use kartsok_sources::test_fetcher::{StubFetcher, StubReply};
//!
//! let empty = StubReply::json(serde_json::json!({ "adresser": [] }));
//! let stub = StubFetcher::new()
//!     .on_query("/adresser/v1/sok", "sok", "Storgata", empty)
//!     .on_path("/stedsnavn/v1/sted", StubReply::Status(503).delayed(Duration::from_secs(1)));
//! assert_eq!(stub.request_count(), 0);
//! ```

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Url;

use crate::{
    error::{Result, SourceError},
    fetch::{Fetcher, Upstream},
};

/// What a stubbed route answers with.
#[derive(Debug, Clone)]
pub enum StubReply {
    /// 2xx with this body
    Body(String),
    /// Non-2xx status
    Status(u16),
    /// Wait, then answer with the inner reply
    Delayed(Duration, Box<Self>),
}

impl StubReply {
    pub fn json(value: serde_json::Value) -> Self {
        Self::Body(value.to_string())
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

type Matcher = Box<dyn Fn(&Url) -> bool + Send + Sync>;

struct Route {
    matcher: Matcher,
    reply: StubReply,
}

#[derive(Default)]
pub struct StubFetcher {
    routes: Vec<Route>,
    requests: Mutex<Vec<Url>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any request whose URL satisfies `matcher`.
    pub fn route(
        mut self,
        matcher: impl Fn(&Url) -> bool + Send + Sync + 'static,
        reply: StubReply,
    ) -> Self {
        self.routes.push(Route {
            matcher: Box::new(matcher),
            reply,
        });
        self
    }

    /// Answer any request to `path`.
    pub fn on_path(self, path: &str, reply: StubReply) -> Self {
        let path = path.to_string();
        self.route(move |url| url.path() == path, reply)
    }

    /// Answer requests to `path` whose query parameter `key` equals `value`.
    pub fn on_query(self, path: &str, key: &str, value: &str, reply: StubReply) -> Self {
        let (path, key, value) = (path.to_string(), key.to_string(), value.to_string());
        self.route(
            move |url| {
                url.path() == path && query_param(url, &key).as_deref() == Some(value.as_str())
            },
            reply,
        )
    }

    /// Every URL requested so far, in request order.
    pub fn requests(&self) -> Vec<Url> {
        self.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.lock().len()
    }

    /// Number of requests made to `path`.
    pub fn requests_to(&self, path: &str) -> usize {
        self.lock().iter().filter(|url| url.path() == path).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Url>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Value of the first query parameter named `key`.
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn get_text(&self, upstream: Upstream, url: Url) -> Result<String> {
        let mut reply = self
            .routes
            .iter()
            .find(|route| (route.matcher)(&url))
            .map_or(StubReply::Status(404), |route| route.reply.clone());
        self.lock().push(url);

        loop {
            match reply {
                StubReply::Body(body) => return Ok(body),
                StubReply::Status(status) => return Err(SourceError::Status { upstream, status }),
                StubReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
