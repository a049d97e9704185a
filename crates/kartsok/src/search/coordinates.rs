//! Recognition of typed coordinates.
//!
//! Four notations are tried in order, the first being the canonical form
//! produced by [`format_canonical`]:
//!
//! | notation | example |
//! |---|---|
//! | canonical | `59.90000°N, 10.75000°E` |
//! | decimal pair | `59.90, 10.75` or `59.90 10.75` |
//! | hemisphere prefix | `N59.90, E10.75` |
//! | degrees-minutes-seconds | `59°54'36"N 10°45'E`, `59 54 36 N 10 45 0 E` |
//!
//! A notation that matches structurally but lands outside the territory is a
//! miss, and the next notation is tried.

use std::fmt;

use kartsok_sources::{ResultKind, ResultSource, SearchResult, Territory};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

const NUMBER: &str = r"(\d{1,3}(?:\.\d+)?)";
const SEPARATOR: &str = r"\s*(?:[,;]\s*|\s)\s*";

static CANONICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*{NUMBER}\s*°\s*([NSns]){SEPARATOR}{NUMBER}\s*°\s*([EWew])\s*$"))
        .expect("Canonical coordinate pattern")
});

static DECIMAL_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d{1,3}(?:\.\d+)?)\s*(?:,\s*|\s+)([+-]?\d{1,3}(?:\.\d+)?)\s*$")
        .expect("Decimal pair pattern")
});

static HEMISPHERE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*([NSns])\s*{NUMBER}\s*°?{SEPARATOR}([EWew])\s*{NUMBER}\s*°?\s*$"))
        .expect("Hemisphere prefix pattern")
});

static DEGREES_MINUTES_SECONDS: Lazy<Regex> = Lazy::new(|| {
    let half = concat!(
        r"(\d{1,3}(?:\.\d+)?)\s*°?",
        r"(?:\s*(\d{1,2}(?:\.\d+)?)\s*['′]?)?",
        r#"(?:\s*(\d{1,2}(?:\.\d+)?)\s*(?:''|["″])?)?\s*"#,
    );
    Regex::new(&format!(r"^\s*{half}([NSns])\s*[,;]?\s*{half}([EWew])\s*$"))
        .expect("Degrees-minutes-seconds pattern")
});

/// How a coordinate was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Notation {
    Decimal,
    DegreesMinutesSeconds,
}

/// A coordinate recognized in user text. Always inside the parser's territory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedCoordinate {
    pub lat: f64,
    pub lng: f64,
    pub notation: Notation,
}

impl ParsedCoordinate {
    /// The coordinate as a result, optionally naming a nearby place.
    pub fn to_search_result(&self, nearby: Option<&str>) -> SearchResult {
        let canonical = format_canonical(self.lat, self.lng);
        let display_name = match nearby {
            Some(place) => format!("{canonical} (near {place})"),
            None => canonical.clone(),
        };
        SearchResult::new(
            format!("coordinates:{:.5},{:.5}", self.lat, self.lng),
            canonical,
            display_name,
            self.lat,
            self.lng,
            ResultKind::Coordinates,
            ResultSource::CoordinateParse,
        )
    }
}

impl fmt::Display for ParsedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_canonical(self.lat, self.lng))
    }
}

/// `59.90000°N, 10.75000°E`. Parses back to the same coordinate (to 5 decimals).
pub fn format_canonical(lat: f64, lng: f64) -> String {
    let ns = if lat < 0.0 { 'S' } else { 'N' };
    let ew = if lng < 0.0 { 'W' } else { 'E' };
    format!("{:.5}°{ns}, {:.5}°{ew}", lat.abs(), lng.abs())
}

/// Turns coordinate text into a [`ParsedCoordinate`] within a territory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateParser {
    territory: Territory,
}

impl CoordinateParser {
    pub const fn new(territory: Territory) -> Self {
        Self { territory }
    }

    pub const fn territory(&self) -> &Territory {
        &self.territory
    }

    /// Parse `text`, returning `None` when no notation yields an in-territory coordinate.
    pub fn parse(&self, text: &str) -> Option<ParsedCoordinate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let parsers: [(&str, fn(&str) -> Option<ParsedCoordinate>); 4] = [
            ("canonical", parse_canonical),
            ("decimal pair", parse_decimal_pair),
            ("hemisphere prefix", parse_hemisphere_prefix),
            ("degrees-minutes-seconds", parse_dms),
        ];

        for (name, parse) in parsers {
            let Some(coordinate) = parse(text) else {
                continue;
            };
            if self.territory.contains(coordinate.lat, coordinate.lng) {
                debug!(
                    notation = name,
                    lat = coordinate.lat,
                    lng = coordinate.lng,
                    "Parsed coordinate"
                );
                return Some(coordinate);
            }
            debug!(
                notation = name,
                lat = coordinate.lat,
                lng = coordinate.lng,
                "Coordinate outside territory"
            );
        }
        None
    }
}

fn number(caps: &Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse().ok()
}

fn signed(value: f64, hemisphere: &str, negative: &[&str]) -> f64 {
    if negative.iter().any(|h| hemisphere.eq_ignore_ascii_case(h)) {
        -value
    } else {
        value
    }
}

fn parse_canonical(text: &str) -> Option<ParsedCoordinate> {
    let caps = CANONICAL.captures(text)?;
    Some(ParsedCoordinate {
        lat: signed(number(&caps, 1)?, &caps[2], &["S"]),
        lng: signed(number(&caps, 3)?, &caps[4], &["W"]),
        notation: Notation::Decimal,
    })
}

fn parse_decimal_pair(text: &str) -> Option<ParsedCoordinate> {
    let caps = DECIMAL_PAIR.captures(text)?;
    Some(ParsedCoordinate {
        lat: number(&caps, 1)?,
        lng: number(&caps, 2)?,
        notation: Notation::Decimal,
    })
}

fn parse_hemisphere_prefix(text: &str) -> Option<ParsedCoordinate> {
    let caps = HEMISPHERE_PREFIX.captures(text)?;
    Some(ParsedCoordinate {
        lat: signed(number(&caps, 2)?, &caps[1], &["S"]),
        lng: signed(number(&caps, 4)?, &caps[3], &["W"]),
        notation: Notation::Decimal,
    })
}

/// Degrees plus optional minutes and seconds, each of the latter below 60.
fn dms_to_degrees(caps: &Captures<'_>, first_group: usize) -> Option<f64> {
    let degrees = number(caps, first_group)?;
    let minutes = caps
        .get(first_group + 1)
        .map_or(Some(0.0), |m| m.as_str().parse().ok())?;
    let seconds = caps
        .get(first_group + 2)
        .map_or(Some(0.0), |s| s.as_str().parse().ok())?;
    if minutes >= 60.0 || seconds >= 60.0 {
        return None;
    }
    Some(degrees + minutes / 60.0 + seconds / 3600.0)
}

fn parse_dms(text: &str) -> Option<ParsedCoordinate> {
    let caps = DEGREES_MINUTES_SECONDS.captures(text)?;
    Some(ParsedCoordinate {
        lat: signed(dms_to_degrees(&caps, 1)?, &caps[4], &["S"]),
        lng: signed(dms_to_degrees(&caps, 5)?, &caps[8], &["W"]),
        notation: Notation::DegreesMinutesSeconds,
    })
}
