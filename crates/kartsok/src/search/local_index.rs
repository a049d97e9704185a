use kartsok_sources::{ResultKind, ResultSource, SearchResult, Territory};
use serde::{Deserialize, Serialize};

/// A point of interest already loaded by the map, e.g. a cabin or a parking lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    /// Caller-defined category, such as `"cabin"`
    pub kind: String,
}

impl PointOfInterest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        lat: f64,
        lng: f64,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            lat,
            lng,
            kind: kind.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }

    fn to_result(&self) -> SearchResult {
        let description = self
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.kind);
        SearchResult::new(
            format!("local:{}", self.id),
            self.name.as_str(),
            self.name.as_str(),
            self.lat,
            self.lng,
            ResultKind::PointOfInterest,
            ResultSource::LocalIndex,
        )
        .with_description(description)
    }
}

/// Substring search over caller-supplied points of interest.
#[derive(Debug, Clone, Copy)]
pub struct LocalIndexSearcher {
    territory: Territory,
    limit: usize,
}

impl LocalIndexSearcher {
    pub const fn new(territory: Territory, limit: usize) -> Self {
        Self { territory, limit }
    }

    /// Points whose name or description contains `normalized_query`, in input order.
    pub fn search(&self, normalized_query: &str, pois: &[PointOfInterest]) -> Vec<SearchResult> {
        let needle = normalized_query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        pois.iter()
            .filter(|poi| self.territory.contains(poi.lat, poi.lng))
            .filter(|poi| poi.matches(&needle))
            .take(self.limit)
            .map(PointOfInterest::to_result)
            .collect()
    }
}
