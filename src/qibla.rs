//! Qibla bearing, great-circle distance and compass helpers.

use serde::{Deserialize, Serialize};

use crate::location::GeoCoordinate;
use crate::solar::{normalize_degrees, DEG};

pub const KAABA: GeoCoordinate = GeoCoordinate { latitude: 21.4225, longitude: 39.8262 };

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Closer than this to the Kaaba or its antipode, every direction is equally valid.
const DEGENERATE_KM: f64 = 0.001;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE",
    "S", "SSW", "SW", "WSW", "W", "WNW", "NW", "NNW",
];

/// Initial great-circle bearing toward the Kaaba.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QiblaBearing {
    /// Degrees clockwise from true north, in [0, 360).
    pub degrees: f64,
    /// At the Kaaba or its antipode; `degrees` is then 0 and meaningless.
    pub degenerate: bool,
}

impl QiblaBearing {
    pub fn compass_point(&self) -> &'static str {
        compass_point(self.degrees)
    }
}

/// Bearing from `coord` to the Kaaba.
pub fn compute_bearing(coord: GeoCoordinate) -> QiblaBearing {
    let distance = distance_km(coord);
    if distance < DEGENERATE_KM || distance > std::f64::consts::PI * EARTH_RADIUS_KM - DEGENERATE_KM {
        return QiblaBearing { degrees: 0.0, degenerate: true };
    }

    let lat1 = coord.latitude * DEG;
    let lat2 = KAABA.latitude * DEG;
    let dlon = (KAABA.longitude - coord.longitude) * DEG;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let degrees = normalize_degrees(y.atan2(x) / DEG);

    // A tiny negative angle normalizes to exactly 360.0
    QiblaBearing {
        degrees: if degrees >= 360.0 { 0.0 } else { degrees },
        degenerate: false,
    }
}

/// Haversine distance to the Kaaba, in kilometres.
pub fn distance_km(coord: GeoCoordinate) -> f64 {
    let lat1 = coord.latitude * DEG;
    let lat2 = KAABA.latitude * DEG;
    let dlat = lat2 - lat1;
    let dlon = (KAABA.longitude - coord.longitude) * DEG;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

/// 16-point compass label for a bearing.
pub fn compass_point(degrees: f64) -> &'static str {
    let index = ((normalize_degrees(degrees) + 11.25) / 22.5) as usize % 16;
    COMPASS_POINTS[index]
}

/// Rotation to apply to a needle so it points at the Qibla on a device facing `heading`.
///
/// Without a heading the needle is drawn relative to true north.
pub fn needle_rotation(bearing: f64, heading: Option<f64>) -> f64 {
    match heading {
        Some(h) => normalize_degrees(bearing - h),
        None => bearing,
    }
}

/// Compass heading from a device-orientation reading.
///
/// An absolute heading (`webkit_heading`) wins; otherwise the heading is
/// derived from the counter-clockwise `alpha` angle.
pub fn heading_from_orientation(alpha: Option<f64>, webkit_heading: Option<f64>) -> Option<f64> {
    match (webkit_heading, alpha) {
        (Some(h), _) => Some(normalize_degrees(h)),
        (None, Some(a)) => Some(normalize_degrees((a - 360.0).abs())),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn coord(lat: f64, lon: f64) -> GeoCoordinate {
        GeoCoordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_due_north_points_south() {
        let b = compute_bearing(coord(40.0, KAABA.longitude));
        assert!(!b.degenerate);
        assert_abs_diff_eq!(b.degrees, 180.0, epsilon = 1e-9);
        assert_eq!(b.compass_point(), "S");
    }

    #[test]
    fn test_due_south_points_north() {
        let b = compute_bearing(coord(-10.0, KAABA.longitude));
        assert_abs_diff_eq!(b.degrees, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_at_kaaba_is_degenerate() {
        let b = compute_bearing(KAABA);
        assert!(b.degenerate);
        assert_eq!(b.degrees, 0.0);
    }

    #[test]
    fn test_antipode_is_degenerate() {
        let b = compute_bearing(coord(-KAABA.latitude, KAABA.longitude - 180.0));
        assert!(b.degenerate);
        let near = compute_bearing(coord(-21.4, -140.2));
        assert!(!near.degenerate);
    }

    #[test]
    fn test_known_cities() {
        let cases = [
            ((40.7128, -74.0060), 58.48, 10306.0),
            ((51.5074, -0.1278), 118.99, 4794.0),
            ((24.8607, 67.0011), 267.74, 2800.0),
            ((-6.2088, 106.8456), 295.15, 7920.0),
            ((24.7136, 46.6753), 243.80, 790.0),
        ];
        for ((lat, lon), bearing, km) in cases {
            let c = coord(lat, lon);
            assert_abs_diff_eq!(compute_bearing(c).degrees, bearing, epsilon = 0.05);
            assert_abs_diff_eq!(distance_km(c), km, epsilon = 5.0);
        }
    }

    #[test]
    fn test_compass_points() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(359.0), "N");
        assert_eq!(compass_point(45.0), "NE");
        assert_eq!(compass_point(90.0), "E");
        assert_eq!(compass_point(202.5), "SSW");
        assert_eq!(compass_point(-90.0), "W");
    }

    #[test]
    fn test_needle_rotation() {
        assert_abs_diff_eq!(needle_rotation(243.8, Some(200.0)), 43.8, epsilon = 1e-9);
        assert_abs_diff_eq!(needle_rotation(10.0, Some(350.0)), 20.0, epsilon = 1e-9);
        assert_eq!(needle_rotation(118.0, None), 118.0);
    }

    #[test]
    fn test_heading_from_orientation() {
        assert_eq!(heading_from_orientation(Some(30.0), Some(120.0)), Some(120.0));
        assert_eq!(heading_from_orientation(Some(30.0), None), Some(330.0));
        assert_eq!(heading_from_orientation(Some(0.0), None), Some(0.0));
        assert_eq!(heading_from_orientation(None, None), None);
    }
}
