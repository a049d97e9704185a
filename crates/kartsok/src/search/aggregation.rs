use itertools::Itertools;
use kartsok_sources::{ResultKind, SearchResult};
use tracing::debug;

/// Merges per-source result lists into one deduplicated, ranked list.
#[derive(Debug, Clone, Copy)]
pub struct ResultAggregator {
    dedup_distance_m: f64,
    max_results: usize,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(500.0, 12)
    }
}

impl ResultAggregator {
    pub const fn new(dedup_distance_m: f64, max_results: usize) -> Self {
        Self {
            dedup_distance_m,
            max_results,
        }
    }

    /// Deduplicate, rank and truncate.
    ///
    /// `result_sets` are concatenated in order; when two results lie closer
    /// than the dedup distance the earlier one wins, so callers pass the most
    /// trusted source first.
    pub fn merge(
        &self,
        result_sets: impl IntoIterator<Item = Vec<SearchResult>>,
        normalized_query: &str,
    ) -> Vec<SearchResult> {
        let mut kept: Vec<SearchResult> = Vec::new();
        for candidate in result_sets.into_iter().flatten() {
            if let Some(existing) = kept
                .iter()
                .find(|k| k.distance_to(&candidate) < self.dedup_distance_m)
            {
                debug!(
                    dropped = %candidate.id,
                    kept = %existing.id,
                    "Dropping near-duplicate result"
                );
                continue;
            }
            kept.push(candidate);
        }

        let query = normalized_query.trim().to_lowercase();
        kept.into_iter()
            .sorted_by_cached_key(|result| RankKey::new(result, &query))
            .take(self.max_results)
            .collect()
    }
}

/// Sort key, ascending = better. Field order is rule precedence.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    not_coordinates: bool,
    not_point_of_interest: bool,
    place_or_address_tier: u8,
    not_exact: bool,
    not_prefix: bool,
    collation: Vec<u32>,
}

impl RankKey {
    fn new(result: &SearchResult, query: &str) -> Self {
        let name = result.name.to_lowercase();
        let exact = !query.is_empty() && name == query;
        let prefix = !query.is_empty() && name.starts_with(query);
        let matched = exact || prefix;

        let place_or_address_tier = match (result.kind, matched) {
            (ResultKind::Place, true) => 0,
            (ResultKind::Address, true) => 1,
            (ResultKind::Place, false) => 2,
            (ResultKind::Address, false) => 3,
            _ => 0,
        };

        Self {
            not_coordinates: result.kind != ResultKind::Coordinates,
            not_point_of_interest: result.kind != ResultKind::PointOfInterest,
            place_or_address_tier,
            not_exact: !exact,
            not_prefix: !prefix,
            collation: collation_key(&result.display_name),
        }
    }
}

/// Norwegian alphabetical order: case-insensitive, `æ ø å` after `z`,
/// other accented letters folded onto their base letter.
pub fn collation_key(text: &str) -> Vec<u32> {
    const AFTER_Z: u32 = 'z' as u32;
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'æ' | 'ä' => AFTER_Z + 1,
            'ø' | 'ö' => AFTER_Z + 2,
            'å' => AFTER_Z + 3,
            'á' | 'à' | 'â' | 'ã' => 'a' as u32,
            'ç' => 'c' as u32,
            'é' | 'è' | 'ê' | 'ë' => 'e' as u32,
            'í' | 'ì' | 'î' | 'ï' => 'i' as u32,
            'ñ' => 'n' as u32,
            'ó' | 'ò' | 'ô' | 'õ' => 'o' as u32,
            'ú' | 'ù' | 'û' => 'u' as u32,
            'ü' | 'ý' | 'ÿ' => 'y' as u32,
            other => other as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use kartsok_sources::{ResultSource, haversine_distance_m};

    use super::*;

    fn result(id: &str, name: &str, kind: ResultKind, lat: f64, lng: f64) -> SearchResult {
        let source = match kind {
            ResultKind::Coordinates => ResultSource::CoordinateParse,
            ResultKind::PointOfInterest => ResultSource::LocalIndex,
            ResultKind::Place => ResultSource::Gazetteer,
            ResultKind::Address => ResultSource::AddressRegistry,
        };
        SearchResult::new(id, name, name, lat, lng, kind, source)
    }

    fn names(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_place_before_address() {
        let merged = ResultAggregator::default().merge(
            [
                vec![],
                vec![],
                vec![result("g", "Oslo", ResultKind::Place, 59.91, 10.75)],
                vec![result("a", "Storgata 1", ResultKind::Address, 60.39, 5.32)],
            ],
            "oslo",
        );
        assert_eq!(names(&merged), ["Oslo", "Storgata 1"]);
    }

    #[test]
    fn test_matching_address_outranks_non_matching_place() {
        let merged = ResultAggregator::default().merge(
            [
                vec![result("g", "Storsjøen", ResultKind::Place, 61.6, 11.2)],
                vec![result("a", "Storgata 1", ResultKind::Address, 59.91, 10.75)],
            ],
            "storgata",
        );
        assert_eq!(names(&merged), ["Storgata 1", "Storsjøen"]);
    }

    #[test]
    fn test_coordinates_then_points_of_interest_first() {
        let merged = ResultAggregator::default().merge(
            [
                vec![result("a", "Kikut 1", ResultKind::Address, 60.5, 10.0)],
                vec![result("g", "Kikut", ResultKind::Place, 61.0, 10.0)],
                vec![result("l", "Kikutstua", ResultKind::PointOfInterest, 62.0, 10.0)],
                vec![result("c", "62.50000°N, 10.00000°E", ResultKind::Coordinates, 62.5, 10.0)],
            ],
            "kikut",
        );
        assert_eq!(
            names(&merged),
            ["62.50000°N, 10.00000°E", "Kikutstua", "Kikut", "Kikut 1"]
        );
    }

    #[test]
    fn test_exact_then_prefix_then_alphabetical() {
        let merged = ResultAggregator::default().merge(
            [vec![
                result("1", "Øvre Sand", ResultKind::Place, 60.0, 9.0),
                result("2", "Sandvika", ResultKind::Place, 60.1, 9.0),
                result("3", "Ås", ResultKind::Place, 60.2, 9.0),
                result("4", "Sand", ResultKind::Place, 60.3, 9.0),
                result("5", "Zinken", ResultKind::Place, 60.4, 9.0),
                result("6", "Aremark", ResultKind::Place, 60.5, 9.0),
            ]],
            "sand",
        );
        assert_eq!(
            names(&merged),
            ["Sand", "Sandvika", "Aremark", "Zinken", "Øvre Sand", "Ås"]
        );
    }

    #[test]
    fn test_dedup_keeps_earlier_source() {
        let coordinate = result(
            "c",
            "59.91000°N, 10.75000°E",
            ResultKind::Coordinates,
            59.91,
            10.75,
        );
        let nearby_place = result("g", "Oslo S", ResultKind::Place, 59.911, 10.752);
        let far_place = result("g2", "Bergen", ResultKind::Place, 60.39, 5.32);

        let merged = ResultAggregator::default().merge(
            [vec![coordinate], vec![], vec![nearby_place, far_place], vec![]],
            "59.91,10.75",
        );
        assert_eq!(names(&merged), ["59.91000°N, 10.75000°E", "Bergen"]);
    }

    #[test]
    fn test_no_pair_closer_than_dedup_distance() {
        // A line of points 200 m apart: each survivor must be >= 500 m from every other
        let line: Vec<_> = (0..30)
            .map(|i| {
                let lat = 60.0 + f64::from(i) * 0.0018;
                result(&i.to_string(), &format!("P{i}"), ResultKind::Place, lat, 10.0)
            })
            .collect();
        let merged = ResultAggregator::new(500.0, 100).merge([line], "p");

        assert!(merged.len() > 1);
        for (a, b) in merged.iter().tuple_combinations() {
            assert!(haversine_distance_m(a.lat, a.lng, b.lat, b.lng) >= 500.0);
        }
    }

    #[test]
    fn test_truncates_to_max_results() {
        let spread: Vec<_> = (0..20)
            .map(|i| {
                let lat = 58.0 + f64::from(i) * 0.5;
                result(&i.to_string(), &format!("Sted {i:02}"), ResultKind::Place, lat, 10.0)
            })
            .collect();
        let merged = ResultAggregator::default().merge([spread], "sted");
        assert_eq!(merged.len(), 12);
        assert_eq!(merged[0].name, "Sted 00");
        assert_eq!(merged[11].name, "Sted 11");
    }

    #[test]
    fn test_collation() {
        assert!(collation_key("Zinken") < collation_key("Ærøy"));
        assert!(collation_key("Ærøy") < collation_key("Øvre"));
        assert!(collation_key("Øvre") < collation_key("Åsen"));
        assert_eq!(collation_key("Rénnebu"), collation_key("rennebu"));
        assert_eq!(collation_key("Müller"), collation_key("myller"));
    }
}
