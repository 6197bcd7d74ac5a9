//! Geographic utilities: great-circle distance and route bounds.

use geo::{BoundingRect, Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::TrackedPoint;

/// Mean Earth radius used for all distance figures, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two coordinates in meters.
///
/// Symmetric, zero for identical coordinates, defined for any finite degree values.
///
/// # Example
/// ```
/// use workout_tracker::geo_utils::distance_meters;
///
/// // One hundredth of a degree of latitude is roughly 1.1 km
/// let d = distance_meters(51.50, -0.12, 51.51, -0.12);
/// assert!((d - 1111.95).abs() < 1.0);
/// ```
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // Clamp guards against a > 1 from rounding on near-antipodal pairs
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// Haversine distance between two tracked points in meters.
pub fn haversine_distance(p1: &TrackedPoint, p2: &TrackedPoint) -> f64 {
    distance_meters(p1.latitude, p1.longitude, p2.latitude, p2.longitude)
}

/// Total path length over consecutive points in meters. Zero for fewer than two points.
pub fn total_distance(points: &[TrackedPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Bounding box of a recorded track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Compute bounds for a set of points. `None` when there are no points.
    pub fn from_points(points: &[TrackedPoint]) -> Option<Self> {
        let line: LineString<f64> = points
            .iter()
            .map(|p| Coord {
                x: p.longitude,
                y: p.latitude,
            })
            .collect();
        let rect = line.bounding_rect()?;

        Some(Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }

    /// Center of the box as (latitude, longitude).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}
