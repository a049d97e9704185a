use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::haversine_distance_m;

/// What a search hit represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKind {
    /// A coordinate typed directly by the user
    Coordinates,
    /// A point of interest already loaded on the map
    PointOfInterest,
    /// A named place from the gazetteer
    Place,
    /// A street address
    Address,
}

/// Which subsystem produced a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultSource {
    CoordinateParse,
    LocalIndex,
    Gazetteer,
    AddressRegistry,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Coordinates => "coordinates",
            Self::PointOfInterest => "point-of-interest",
            Self::Place => "place",
            Self::Address => "address",
        };
        f.write_str(label)
    }
}

impl fmt::Display for ResultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CoordinateParse => "coordinate-parse",
            Self::LocalIndex => "local-index",
            Self::Gazetteer => "gazetteer",
            Self::AddressRegistry => "address-registry",
        };
        f.write_str(label)
    }
}

/// A normalized search hit, whatever source it came from.
///
/// Results are built fresh for every query and never modified afterwards, which
/// is what allows the result cache to hand out clones of them.
///
/// # Examples
///
/// ```rust
/// use kartsok_sources::{ResultKind, ResultSource, SearchResult};
///
/// let result = SearchResult::new(
///     "gazetteer:1",
///     "Preikestolen",
///     "Preikestolen, Strand",
///     58.9864,
///     6.1904,
///     ResultKind::Place,
///     ResultSource::Gazetteer,
/// )
/// .with_municipality("Strand");
///
/// assert_eq!(result.municipality.as_deref(), Some("Strand"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Stable identifier, unique per source and upstream identifier
    pub id: String,
    /// Short proper-case label
    pub name: String,
    /// User-facing label, may carry administrative context
    pub display_name: String,
    /// WGS84 latitude in decimal degrees
    pub lat: f64,
    /// WGS84 longitude in decimal degrees
    pub lng: f64,
    pub kind: ResultKind,
    pub source: ResultSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// West, south, east, north. None of the registries report an extent, so
    /// results built here leave it unset; it survives a serde round trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<[f64; 4]>,
}

impl SearchResult {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        display_name: impl Into<String>,
        lat: f64,
        lng: f64,
        kind: ResultKind,
        source: ResultSource,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            display_name: display_name.into(),
            lat,
            lng,
            kind,
            source,
            description: None,
            municipality: None,
            county: None,
            bounding_box: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_municipality(mut self, municipality: impl Into<String>) -> Self {
        self.municipality = Some(municipality.into());
        self
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }

    /// Great-circle distance to another result, in metres.
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_distance_m(self.lat, self.lng, other.lat, other.lng)
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({:.5}, {:.5})",
            self.display_name, self.kind, self.lat, self.lng
        )
    }
}
