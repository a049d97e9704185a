//! kartsok - Federated Location Search for Outdoor Maps
//!
//! kartsok turns whatever a user types into a map's search box into one ranked
//! list of locations. A single query fans out to several independent sources:
//!
//! - **Coordinates** typed in decimal, hemisphere-prefixed or
//!   degrees-minutes-seconds notation
//! - **Points of interest** the map already has loaded (cabins, parking, ...)
//! - the Norwegian **place-name registry** (gazetteer)
//! - the Norwegian **address registry**, with street-only and fuzzy fallbacks
//!
//! Results are deduplicated by distance, ranked, capped and cached.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kartsok::{PointOfInterest, SearchOrchestrator};
//!
//! # async fn run() -> kartsok::error::Result<()> {
//! kartsok::init_logging(tracing::Level::INFO)?;
//!
//! let orchestrator = SearchOrchestrator::new()?;
//! let pois = vec![PointOfInterest::new("1", "Kikutstua", 60.0539, 10.6453, "cabin")];
//!
//! let results = orchestrator.search("Galdhøpiggen", &pois).await;
//! if let Some(best) = results.first() {
//!     println!("Found: {} ({:.4}, {:.4})", best.display_name, best.lat, best.lng);
//! }
//!
//! // Coordinates come back first, named after a nearby place when one is known
//! let results = orchestrator.search("61°38'11\"N 8°18'45\"E", &pois).await;
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! `search` never returns an error. An upstream that times out, answers with
//! an error status or sends a malformed payload is logged and contributes no
//! results, while the other sources are unaffected.

use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod cache;
mod config;
mod context;
mod core;
pub mod error;
mod search;

pub use core::{SearchOrchestrator, SearchOrchestratorBuilder};

pub use cache::{CacheEntry, ResultCache};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use context::SearchContext;
pub use kartsok_sources as sources;
pub use kartsok_sources::{ResultKind, ResultSource, SearchResult, Territory};
pub use search::{
    CoordinateParser, LocalIndexSearcher, Notation, ParsedCoordinate, PointOfInterest,
    ResultAggregator, collation_key, format_canonical,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for kartsok.
///
/// Installs a formatted `tracing` subscriber. `RUST_LOG` takes precedence over
/// `level` when set. The HTTP stack is capped at `warn`. Calling this more than
/// once is a no-op.
///
/// # Examples
///
/// ```rust
/// use kartsok::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), kartsok::error::KartsokError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> error::Result<()> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok::<_, error::KartsokError>(())
    })?;
    Ok(())
}
