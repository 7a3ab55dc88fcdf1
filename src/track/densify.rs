// src/track/densify.rs
//! Resampling of irregular GPS tracks to a uniform point spacing

use super::{Track, TrackPoint};
use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Consecutive points closer than this are treated as the same position
pub const DUPLICATE_THRESHOLD_M: f64 = 0.1;

/// Spacing used when nothing else is configured
pub const DEFAULT_TARGET_SPACING_M: f64 = 5.0;

/// Number of buckets in the spacing distribution of a [`DensityReport`]
const REPORT_BUCKETS: usize = 8;

/// Spacings below this are ignored by the quality report
const REPORT_MIN_DISTANCE_M: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensificationPolicy {
    pub target_spacing_m: f64,
}

impl DensificationPolicy {
    pub fn new(target_spacing_m: f64) -> Result<Self> {
        let policy = Self { target_spacing_m };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_spacing_m.is_finite() || self.target_spacing_m <= 0.0 {
            return Err(TrackError::InvalidPolicy(format!(
                "target spacing must be a positive number of meters, got {}",
                self.target_spacing_m
            )));
        }
        Ok(())
    }
}

impl Default for DensificationPolicy {
    fn default() -> Self {
        Self {
            target_spacing_m: DEFAULT_TARGET_SPACING_M,
        }
    }
}

/// Number of sub-segments a segment of `distance` meters is split into.
///
/// Rounds half away from zero (`2.5 -> 3`), never returns less than one and
/// never produces sub-segments shorter than [`DUPLICATE_THRESHOLD_M`].
pub fn segment_count(distance: f64, target_spacing_m: f64) -> usize {
    let segments = (distance / target_spacing_m).round().max(1.0);
    let cap = (distance / DUPLICATE_THRESHOLD_M).floor().max(1.0);
    segments.min(cap) as usize
}

/// Insert interpolated points so consecutive spacing approximates the policy target.
///
/// Duplicate points (closer than [`DUPLICATE_THRESHOLD_M`] to the previously
/// kept point) are collapsed into the earlier one. Original points are kept
/// unchanged and in order.
pub fn densify(track: &Track, policy: &DensificationPolicy) -> Result<Track> {
    policy.validate()?;
    let (first, rest) = track.points.split_first().ok_or(TrackError::EmptyTrack)?;

    let mut points: Vec<TrackPoint> = Vec::with_capacity(track.len());
    let mut anchor = *first;
    let mut collapsed = 0usize;
    points.push(anchor);

    for next in rest {
        let distance = anchor.distance_to(next);
        if distance < DUPLICATE_THRESHOLD_M {
            collapsed += 1;
            continue;
        }

        let segments = segment_count(distance, policy.target_spacing_m);
        for k in 1..segments {
            points.push(anchor.interpolate(next, k as f64 / segments as f64));
        }

        points.push(*next);
        anchor = *next;
    }

    tracing::debug!(
        original = track.len(),
        densified = points.len(),
        collapsed,
        target_spacing_m = policy.target_spacing_m,
        "densified track"
    );

    let densified = Track {
        name: track.name.clone(),
        points,
    };

    if let Some(report) = DensityReport::from_track(&densified, policy.target_spacing_m) {
        tracing::debug!("{}", report);
    }

    Ok(densified)
}

/// Spacing statistics of a track, used to check densification quality
#[derive(Debug, Clone, PartialEq)]
pub struct DensityReport {
    pub segments: usize,
    pub min_m: f64,
    pub max_m: f64,
    pub mean_m: f64,
    pub median_m: f64,
    pub bucket_width_m: f64,
    /// Segment counts per bucket, the last bucket is open-ended
    pub buckets: [usize; REPORT_BUCKETS],
}

impl DensityReport {
    /// Returns `None` when the track has no measurable spacing
    pub fn from_track(track: &Track, target_spacing_m: f64) -> Option<Self> {
        let mut distances: Vec<f64> = track
            .segment_distances()
            .into_iter()
            .filter(|d| *d > REPORT_MIN_DISTANCE_M)
            .collect();

        if distances.is_empty() {
            return None;
        }

        distances.sort_by(|a, b| a.total_cmp(b));

        let segments = distances.len();
        let mid = segments / 2;
        let median_m = if segments % 2 == 1 {
            distances[mid]
        } else {
            (distances[mid - 1] + distances[mid]) / 2.0
        };

        let bucket_width_m = target_spacing_m / 5.0;
        let mut buckets = [0usize; REPORT_BUCKETS];
        for d in &distances {
            let index = ((d / bucket_width_m).floor() as usize).min(REPORT_BUCKETS - 1);
            buckets[index] += 1;
        }

        Some(Self {
            segments,
            min_m: distances[0],
            max_m: distances[segments - 1],
            mean_m: distances.iter().sum::<f64>() / segments as f64,
            median_m,
            bucket_width_m,
            buckets,
        })
    }
}

impl fmt::Display for DensityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Quality Check ===")?;
        writeln!(f, "Distance range: {:.2}m - {:.2}m", self.min_m, self.max_m)?;
        writeln!(f, "Average: {:.2}m", self.mean_m)?;
        writeln!(f, "Median: {:.2}m", self.median_m)?;
        write!(f, "Distribution:")?;

        for (i, count) in self.buckets.iter().enumerate() {
            if *count == 0 {
                continue;
            }
            let lower = i as f64 * self.bucket_width_m;
            let label = if i == REPORT_BUCKETS - 1 {
                format!("{:.1}m+", lower)
            } else {
                format!("{:.1}-{:.1}m", lower, lower + self.bucket_width_m)
            };
            let percent = *count as f64 / self.segments as f64 * 100.0;
            write!(f, "\n  {}: {:.1}% ({} segments)", label, percent, count)?;
        }

        Ok(())
    }
}
