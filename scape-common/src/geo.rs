//! Geodesy helpers
//!
//! Locations use WGS84 degrees. Distances are great-circle (haversine) meters on
//! a sphere with the equatorial Earth radius; bearings are initial bearings in
//! degrees clockwise from true north, normalized to `[0, 360)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Equatorial Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Normalize an angle in degrees to `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Add `delta` degrees to a heading, wrapping around the compass
pub fn add_degrees(heading: f64, delta: f64) -> f64 {
    normalize_degrees(heading + delta)
}

/// Whether a course or heading value is usable (finite and within `[0, 360)`)
pub fn is_valid_direction(degrees: f64) -> bool {
    degrees.is_finite() && (0.0..360.0).contains(&degrees)
}

/// Whether a speed value is usable (finite and non-negative)
pub fn is_valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed >= 0.0
}

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance in meters
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Initial bearing toward `other` in degrees `[0, 360)`
    pub fn bearing_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let y = d_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

        normalize_degrees(y.atan2(x).to_degrees())
    }
}

/// A fix: coordinate plus the optional sensor values that accompany it
///
/// Absent values are `None` rather than sentinel negatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: Coordinate,
    pub altitude: Option<f64>,
    pub horizontal_accuracy: Option<f64>,
    pub vertical_accuracy: Option<f64>,
    /// Direction of travel, degrees clockwise from true north
    pub course: Option<f64>,
    /// Meters per second
    pub speed: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::from_coordinate(Coordinate::new(latitude, longitude))
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            altitude: None,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            course: None,
            speed: None,
            timestamp: None,
        }
    }

    /// Copy with the course replaced (invalid values clear it)
    pub fn with_course(mut self, course: f64) -> Self {
        self.course = Some(course).filter(|c| is_valid_direction(*c));
        self
    }

    /// Copy with the speed replaced (invalid values clear it)
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed).filter(|s| is_valid_speed(*s));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn distance_to(&self, other: &Location) -> f64 {
        self.coordinate.distance_to(&other.coordinate)
    }

    pub fn bearing_to(&self, other: &Location) -> f64 {
        self.coordinate.bearing_to(&other.coordinate)
    }
}

/// Closed polygon of coordinates
///
/// The ring is considered closed whether or not the last vertex repeats the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Coordinate>,
}

impl Polygon {
    pub fn new(vertices: Vec<Coordinate>) -> Self {
        Self { vertices }
    }

    /// Even-odd ray casting in the lat/lon plane
    pub fn contains(&self, point: &Coordinate) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = self.vertices.len() - 1;

        for i in 0..self.vertices.len() {
            let a = &self.vertices[i];
            let b = &self.vertices[j];

            if (a.latitude > point.latitude) != (b.latitude > point.latitude) {
                let crossing = (b.longitude - a.longitude) * (point.latitude - a.latitude)
                    / (b.latitude - a.latitude)
                    + a.longitude;
                if point.longitude < crossing {
                    inside = !inside;
                }
            }

            j = i;
        }

        inside
    }
}
