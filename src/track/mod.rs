// src/track/mod.rs
//! Track data structures, densification and statistics

pub mod densify;
pub mod geodesy;
pub mod gpx_file;
pub mod metrics;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use densify::{densify, DensificationPolicy, DensityReport};
pub use geodesy::distance_meters;
pub use metrics::{TimingSummary, TrackSummary};

/// A single recorded position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    pub elevation_m: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64, elevation_m: f64) -> Self {
        Self {
            lat,
            lon,
            elevation_m,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Great-circle distance to another point in meters
    pub fn distance_to(&self, other: &TrackPoint) -> f64 {
        distance_meters(self.lat, self.lon, other.lat, other.lon)
    }

    /// Point at parameter `t` (0..=1) on the straight lat/lon line towards `other`.
    ///
    /// The timestamp is only interpolated when both ends carry one.
    pub fn interpolate(&self, other: &TrackPoint, t: f64) -> TrackPoint {
        let timestamp = match (self.timestamp, other.timestamp) {
            (Some(t1), Some(t2)) => Some(interpolate_time(t1, t2, t)),
            _ => None,
        };

        TrackPoint {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
            elevation_m: self.elevation_m + (other.elevation_m - self.elevation_m) * t,
            timestamp,
        }
    }
}

fn interpolate_time(t1: DateTime<Utc>, t2: DateTime<Utc>, t: f64) -> DateTime<Utc> {
    let span = t2.signed_duration_since(t1);
    let offset = match span.num_nanoseconds() {
        Some(ns) => Duration::nanoseconds((ns as f64 * t).round() as i64),
        None => Duration::milliseconds((span.num_milliseconds() as f64 * t).round() as i64),
    };
    t1 + offset
}

/// An ordered sequence of points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: Option<String>,
    pub points: Vec<TrackPoint>,
}

impl Track {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self { name: None, points }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    /// Distances in meters between consecutive points
    pub fn segment_distances(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .collect()
    }

    /// Whether any point carries a timestamp
    pub fn has_timestamps(&self) -> bool {
        self.points.iter().any(|p| p.timestamp.is_some())
    }
}

impl From<Vec<TrackPoint>> for Track {
    fn from(points: Vec<TrackPoint>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_interpolate_midpoint() {
        let a = TrackPoint::new(10.0, 20.0, 100.0);
        let b = TrackPoint::new(12.0, 24.0, 200.0);
        let mid = a.interpolate(&b, 0.5);
        assert_eq!(mid.lat, 11.0);
        assert_eq!(mid.lon, 22.0);
        assert_eq!(mid.elevation_m, 150.0);
        assert!(mid.timestamp.is_none());
    }

    #[test]
    fn test_interpolate_timestamp() {
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 10).unwrap();
        let a = TrackPoint::new(0.0, 0.0, 0.0).with_timestamp(t1);
        let b = TrackPoint::new(0.0, 1.0, 0.0).with_timestamp(t2);

        let p = a.interpolate(&b, 0.25);
        assert_eq!(p.timestamp, Some(t1 + Duration::milliseconds(2500)));
    }

    #[test]
    fn test_interpolate_drops_half_timestamp() {
        let t1 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let a = TrackPoint::new(0.0, 0.0, 0.0).with_timestamp(t1);
        let b = TrackPoint::new(0.0, 1.0, 0.0);
        assert!(a.interpolate(&b, 0.5).timestamp.is_none());
    }

    #[test]
    fn test_segment_distances() {
        let track = Track::new(vec![
            TrackPoint::new(0.0, 0.0, 0.0),
            TrackPoint::new(0.0, 0.001, 0.0),
            TrackPoint::new(0.0, 0.002, 0.0),
        ]);
        let distances = track.segment_distances();
        assert_eq!(distances.len(), 2);
        assert!((distances[0] - distances[1]).abs() < 1e-6);
    }
}
