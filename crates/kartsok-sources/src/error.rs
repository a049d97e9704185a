use std::time::Duration;

use thiserror::Error;

use crate::fetch::Upstream;

pub type Result<T> = std::result::Result<T, SourceError>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{upstream} returned status {status}")]
    Status { upstream: Upstream, status: u16 },
    #[error("{upstream} did not answer within {after:?}")]
    Timeout { upstream: Upstream, after: Duration },
    #[error("Malformed upstream payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid endpoint for {name}: {reason}")]
    InvalidEndpoint { name: &'static str, reason: String },
    #[error("Invalid value for {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

impl SourceError {
    /// Whether the failure came from the client-side deadline rather than the upstream.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
