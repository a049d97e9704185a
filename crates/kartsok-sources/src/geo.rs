use serde::{Deserialize, Serialize};

/// Mean earth radius (IUGG) in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two WGS84 points, in metres.
pub fn haversine_distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Rectangular lat/lng envelope used to reject out-of-region coordinates.
///
/// Every [`crate::SearchResult`] handed out by this workspace lies inside the
/// configured territory; parses and upstream records outside it are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Territory {
    /// Mainland Norway with a margin for the coast and border areas.
    pub const NORWAY: Self = Self {
        west: 4.0,
        south: 57.5,
        east: 31.5,
        north: 71.5,
    };

    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat.is_finite()
            && lng.is_finite()
            && (self.south..=self.north).contains(&lat)
            && (self.west..=self.east).contains(&lng)
    }

    /// A box is usable when it is non-empty and lies within WGS84 limits.
    pub fn is_valid(&self) -> bool {
        self.south < self.north
            && self.west < self.east
            && self.south >= -90.0
            && self.north <= 90.0
            && self.west >= -180.0
            && self.east <= 180.0
    }

    /// West/south/east/north.
    pub const fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

impl Default for Territory {
    fn default() -> Self {
        Self::NORWAY
    }
}
