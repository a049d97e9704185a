//! The per-source searchers that run inside the process.
//!
//! Coordinate recognition, the local point-of-interest index and the final
//! merge/rank step live here; the network-backed sources are in
//! [`kartsok_sources`].

mod aggregation;
mod coordinates;
mod local_index;

pub use aggregation::{ResultAggregator, collation_key};
pub use coordinates::{CoordinateParser, Notation, ParsedCoordinate, format_canonical};
pub use local_index::{LocalIndexSearcher, PointOfInterest};
