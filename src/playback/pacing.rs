// src/playback/pacing.rs
//! How long each point waits before it is revealed

use crate::error::{Result, TrackError};
use crate::track::Track;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speed multipliers below this are treated as this value
pub const SPEED_MULTIPLIER_FLOOR: f64 = 0.5;

/// Smallest per-point delay the distance-weighted strategy produces
pub const MIN_WEIGHTED_DELAY_MS: f64 = 10.0;

/// Weight of the previous value in the segment distance moving average
pub const SMOOTHING_ALPHA: f64 = 0.75;

pub const DEFAULT_INTENSITY: f64 = 1.5;

/// Upper bound on how much slower than nominal a single point may be
const MAX_SLOWDOWN: f64 = 10.0;

/// Total wall-clock budget of a playback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Reveal the whole sequence in a fixed time
    FixedDuration { total_duration_secs: f64 },
    /// Reveal at a base rate scaled by a speed multiplier
    RateControl {
        base_ms_per_point: f64,
        speed_multiplier: f64,
    },
}

impl DurationPolicy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            DurationPolicy::FixedDuration { total_duration_secs } => {
                if !total_duration_secs.is_finite() || total_duration_secs <= 0.0 {
                    return Err(TrackError::InvalidPolicy(format!(
                        "duration must be a positive number of seconds, got {}",
                        total_duration_secs
                    )));
                }
            }
            DurationPolicy::RateControl {
                base_ms_per_point,
                speed_multiplier,
            } => {
                if !base_ms_per_point.is_finite() || base_ms_per_point <= 0.0 {
                    return Err(TrackError::InvalidPolicy(format!(
                        "base delay must be a positive number of milliseconds, got {}",
                        base_ms_per_point
                    )));
                }
                if !speed_multiplier.is_finite() {
                    return Err(TrackError::InvalidPolicy(format!(
                        "speed multiplier must be finite, got {}",
                        speed_multiplier
                    )));
                }
            }
        }
        Ok(())
    }

    /// Average delay per point for a sequence of `len` points
    pub fn nominal_ms_per_point(&self, len: usize) -> f64 {
        match *self {
            DurationPolicy::FixedDuration { total_duration_secs } => {
                total_duration_secs * 1000.0 / len.max(1) as f64
            }
            DurationPolicy::RateControl {
                base_ms_per_point,
                speed_multiplier,
            } => base_ms_per_point / speed_multiplier.max(SPEED_MULTIPLIER_FLOOR),
        }
    }
}

/// Which strategy paces the reveal
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PacingMode {
    #[default]
    FixedRate,
    /// Replay speed follows recorded speed; `intensity` is the exponent
    /// applied to the normalized segment length
    DistanceWeighted { intensity: f64 },
}

impl PacingMode {
    pub fn validate(&self) -> Result<()> {
        if let PacingMode::DistanceWeighted { intensity } = *self {
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(TrackError::InvalidPolicy(format!(
                    "intensity must be a non-negative number, got {}",
                    intensity
                )));
            }
        }
        Ok(())
    }
}

pub trait PacingStrategy: fmt::Debug + Send {
    /// Milliseconds that must accumulate before the point at `index` is revealed.
    ///
    /// Called exactly once per revealed point, in increasing index order.
    fn delay_ms(&mut self, index: usize) -> f64;
}

/// Constant delay for every point
#[derive(Debug, Clone)]
pub struct FixedRate {
    ms_per_point: f64,
}

impl FixedRate {
    pub fn new(ms_per_point: f64) -> Self {
        Self { ms_per_point }
    }
}

impl PacingStrategy for FixedRate {
    fn delay_ms(&mut self, _index: usize) -> f64 {
        self.ms_per_point
    }
}

/// Delay inversely weighted by the smoothed length of the segment being revealed
#[derive(Debug, Clone)]
pub struct DistanceWeighted {
    nominal_ms: f64,
    intensity: f64,
    segments: Vec<f64>,
    mean_segment_m: f64,
    smoothed_m: f64,
}

impl DistanceWeighted {
    pub fn new(track: &Track, nominal_ms: f64, intensity: f64) -> Self {
        let segments = track.segment_distances();
        let mean_segment_m = if segments.is_empty() {
            0.0
        } else {
            segments.iter().sum::<f64>() / segments.len() as f64
        };

        Self {
            nominal_ms,
            intensity,
            segments,
            mean_segment_m,
            smoothed_m: mean_segment_m,
        }
    }
}

impl PacingStrategy for DistanceWeighted {
    fn delay_ms(&mut self, index: usize) -> f64 {
        if self.mean_segment_m <= 0.0 {
            return self.nominal_ms.max(MIN_WEIGHTED_DELAY_MS);
        }

        // segment ending at `index`; the first point has none
        let current = match index.checked_sub(1).and_then(|i| self.segments.get(i)) {
            Some(d) => *d,
            None => self.mean_segment_m,
        };
        self.smoothed_m = SMOOTHING_ALPHA * self.smoothed_m + (1.0 - SMOOTHING_ALPHA) * current;

        let factor = if self.smoothed_m > 0.0 {
            (self.mean_segment_m / self.smoothed_m)
                .powf(self.intensity)
                .min(MAX_SLOWDOWN)
        } else {
            MAX_SLOWDOWN
        };

        (self.nominal_ms * factor).max(MIN_WEIGHTED_DELAY_MS)
    }
}

/// Build the strategy for `mode` over `track`
pub fn build_strategy(
    track: &Track,
    policy: &DurationPolicy,
    mode: &PacingMode,
) -> Result<Box<dyn PacingStrategy>> {
    policy.validate()?;
    mode.validate()?;

    let nominal_ms = policy.nominal_ms_per_point(track.len());
    let strategy: Box<dyn PacingStrategy> = match *mode {
        PacingMode::FixedRate => Box::new(FixedRate::new(nominal_ms)),
        PacingMode::DistanceWeighted { intensity } => {
            Box::new(DistanceWeighted::new(track, nominal_ms, intensity))
        }
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;

    /// Ten short hops of ~10 m followed by ten long hops of ~40 m
    fn slow_then_fast() -> Track {
        let mut lon = 0.0;
        let mut points = vec![TrackPoint::new(0.0, lon, 0.0)];
        for i in 0..20 {
            lon += if i < 10 { 0.00009 } else { 0.00036 };
            points.push(TrackPoint::new(0.0, lon, 0.0));
        }
        Track::new(points)
    }

    #[test]
    fn test_fixed_duration_rate() {
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 1.0,
        };
        assert_eq!(policy.nominal_ms_per_point(10), 100.0);
    }

    #[test]
    fn test_rate_control_floors_multiplier() {
        let slow = DurationPolicy::RateControl {
            base_ms_per_point: 100.0,
            speed_multiplier: 0.01,
        };
        assert_eq!(slow.nominal_ms_per_point(10), 200.0);

        let fast = DurationPolicy::RateControl {
            base_ms_per_point: 100.0,
            speed_multiplier: 4.0,
        };
        assert_eq!(fast.nominal_ms_per_point(10), 25.0);
    }

    #[test]
    fn test_invalid_policies() {
        let zero = DurationPolicy::FixedDuration {
            total_duration_secs: 0.0,
        };
        assert!(matches!(zero.validate(), Err(TrackError::InvalidPolicy(_))));

        let negative = DurationPolicy::RateControl {
            base_ms_per_point: -1.0,
            speed_multiplier: 1.0,
        };
        assert!(matches!(negative.validate(), Err(TrackError::InvalidPolicy(_))));

        let mode = PacingMode::DistanceWeighted {
            intensity: f64::NAN,
        };
        assert!(matches!(mode.validate(), Err(TrackError::InvalidPolicy(_))));
    }

    #[test]
    fn test_long_segments_reveal_faster() {
        let track = slow_then_fast();
        let mut pacing = DistanceWeighted::new(&track, 50.0, DEFAULT_INTENSITY);
        let delays: Vec<f64> = (0..track.len()).map(|i| pacing.delay_ms(i)).collect();

        // end of the short-hop stretch versus end of the long-hop stretch
        assert!(delays[10] > 50.0, "short hops should be slower, got {}", delays[10]);
        assert!(delays[20] < 50.0, "long hops should be faster, got {}", delays[20]);
        assert!(delays[10] > delays[20]);
    }

    #[test]
    fn test_uniform_spacing_keeps_nominal_delay() {
        let track = Track::new(
            (0..6)
                .map(|i| TrackPoint::new(0.0, i as f64 * 0.0001, 0.0))
                .collect(),
        );
        let mut pacing = DistanceWeighted::new(&track, 40.0, 2.0);
        for i in 0..track.len() {
            assert!((pacing.delay_ms(i) - 40.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_weighted_delay_floor() {
        let track = slow_then_fast();
        let mut pacing = DistanceWeighted::new(&track, 1.0, 3.0);
        for i in 0..track.len() {
            assert!(pacing.delay_ms(i) >= MIN_WEIGHTED_DELAY_MS);
        }
    }

    #[test]
    fn test_single_point_weighted() {
        let track = Track::new(vec![TrackPoint::new(0.0, 0.0, 0.0)]);
        let mut pacing = DistanceWeighted::new(&track, 100.0, 1.5);
        assert_eq!(pacing.delay_ms(0), 100.0);
    }

    #[test]
    fn test_build_strategy_validates() {
        let track = slow_then_fast();
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: -3.0,
        };
        assert!(build_strategy(&track, &policy, &PacingMode::FixedRate).is_err());
    }
}
