// src/track/metrics.rs
//! Trip statistics: distance, elevation, timing, speed and calories

use super::{Track, TrackPoint};
use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};

/// Segments slower than this do not count as moving
pub const MOVING_SPEED_THRESHOLD_KMH: f64 = 1.0;

/// Extra mass (bike and gear) added to the rider for the climbing term
const EQUIPMENT_WEIGHT_KG: f64 = 10.0;

/// kcal per kg per meter climbed
const CLIMB_FACTOR: f64 = 0.06;

/// Sum of great-circle distances between consecutive points, in kilometers
pub fn total_distance_km(points: &[TrackPoint]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum::<f64>()
        / 1000.0
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElevationSummary {
    pub gain_m: f64,
    pub loss_m: f64,
}

pub fn elevation(points: &[TrackPoint]) -> ElevationSummary {
    let mut summary = ElevationSummary::default();
    for pair in points.windows(2) {
        let diff = pair[1].elevation_m - pair[0].elevation_m;
        if diff > 0.0 {
            summary.gain_m += diff;
        } else if diff < 0.0 {
            summary.loss_m -= diff;
        }
    }
    summary
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingSummary {
    pub total_time_secs: f64,
    pub moving_time_secs: f64,
    pub max_speed_kmh: f64,
}

/// Total and moving time plus maximum speed.
///
/// Fails with [`TrackError::InsufficientData`] when fewer than two points
/// carry a timestamp.
pub fn time_and_speed(points: &[TrackPoint]) -> Result<TimingSummary> {
    let mut stamped = points.iter().filter_map(|p| p.timestamp);
    let first = stamped.next();
    let last = stamped.last();

    let (first, last) = match (first, last) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(TrackError::InsufficientData(
                "fewer than two points carry timestamps".to_string(),
            ))
        }
    };

    let mut moving_time_secs = 0.0;
    let mut max_speed_kmh: f64 = 0.0;

    for pair in points.windows(2) {
        let (Some(t1), Some(t2)) = (pair[0].timestamp, pair[1].timestamp) else {
            continue;
        };
        let secs = t2.signed_duration_since(t1).num_milliseconds() as f64 / 1000.0;
        if secs <= 0.0 {
            continue;
        }

        let speed_kmh = pair[0].distance_to(&pair[1]) / 1000.0 / secs * 3600.0;
        max_speed_kmh = max_speed_kmh.max(speed_kmh);
        if speed_kmh > MOVING_SPEED_THRESHOLD_KMH {
            moving_time_secs += secs;
        }
    }

    Ok(TimingSummary {
        total_time_secs: last.signed_duration_since(first).num_milliseconds() as f64 / 1000.0,
        moving_time_secs,
        max_speed_kmh,
    })
}

/// MET value for cycling at the given average speed
pub fn cycling_met(avg_speed_kmh: f64) -> f64 {
    match avg_speed_kmh {
        s if s < 16.0 => 4.0,
        s if s < 19.0 => 6.0,
        s if s < 22.0 => 8.0,
        s if s < 25.0 => 10.0,
        _ => 12.0,
    }
}

/// Estimated energy in kcal, rounded to the nearest unit
pub fn estimated_calories(
    distance_km: f64,
    moving_time_secs: f64,
    elevation_gain_m: f64,
    weight_kg: f64,
) -> f64 {
    let moving_hours = moving_time_secs / 3600.0;
    let base = if moving_hours > 0.0 {
        cycling_met(distance_km / moving_hours) * weight_kg * moving_hours
    } else {
        0.0
    };
    let climb = (weight_kg + EQUIPMENT_WEIGHT_KG) * elevation_gain_m * CLIMB_FACTOR;

    (base + climb).round()
}

/// Format seconds as `HH:MM:SS`
pub fn format_hms(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Everything the results screen shows for a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    pub points: usize,
    pub distance_km: f64,
    pub elevation: ElevationSummary,
    /// `None` when the track has no usable timestamps
    pub timing: Option<TimingSummary>,
    pub calories: Option<f64>,
}

impl TrackSummary {
    pub fn from_track(track: &Track, weight_kg: f64) -> Result<Self> {
        if track.is_empty() {
            return Err(TrackError::EmptyTrack);
        }

        let distance_km = total_distance_km(&track.points);
        let elevation = elevation(&track.points);
        let timing = match time_and_speed(&track.points) {
            Ok(timing) => Some(timing),
            Err(e) if e.is_insufficient_data() => None,
            Err(e) => return Err(e),
        };
        let calories = timing.map(|t| {
            estimated_calories(distance_km, t.moving_time_secs, elevation.gain_m, weight_kg)
        });

        Ok(Self {
            points: track.len(),
            distance_km,
            elevation,
            timing,
            calories,
        })
    }

    /// Average speed over moving time in km/h
    pub fn moving_speed_kmh(&self) -> Option<f64> {
        let timing = self.timing?;
        (timing.moving_time_secs > 0.0)
            .then(|| self.distance_km / (timing.moving_time_secs / 3600.0))
    }

    /// Average speed over elapsed time in km/h
    pub fn total_speed_kmh(&self) -> Option<f64> {
        let timing = self.timing?;
        (timing.total_time_secs > 0.0)
            .then(|| self.distance_km / (timing.total_time_secs / 3600.0))
    }
}
