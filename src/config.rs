// src/config.rs
//! Persisted replay settings

use crate::error::{Result, TrackError};
use crate::playback::pacing::{DurationPolicy, PacingMode, DEFAULT_INTENSITY};
use crate::track::densify::{DensificationPolicy, DEFAULT_TARGET_SPACING_M};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_WEIGHT_KG: f64 = 80.0;
pub const DEFAULT_DURATION_SECS: f64 = 60.0;
pub const DEFAULT_BASE_MS_PER_POINT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingKind {
    #[default]
    Fixed,
    Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub target_spacing_m: f64,
    pub use_densified: bool,
    pub animation_duration_secs: f64,
    pub pacing: PacingKind,
    /// When set, playback runs at `base_ms_per_point / speed` instead of a fixed duration
    pub speed_multiplier: Option<f64>,
    pub base_ms_per_point: f64,
    pub intensity: f64,
    pub weight_kg: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            target_spacing_m: DEFAULT_TARGET_SPACING_M,
            use_densified: true,
            animation_duration_secs: DEFAULT_DURATION_SECS,
            pacing: PacingKind::Fixed,
            speed_multiplier: None,
            base_ms_per_point: DEFAULT_BASE_MS_PER_POINT,
            intensity: DEFAULT_INTENSITY,
            weight_kg: DEFAULT_WEIGHT_KG,
        }
    }
}

impl ReplayConfig {
    /// Load configuration from the config file, defaults when it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| TrackError::Other(format!("Failed to read config file: {}", e)))?;

        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| TrackError::Other(format!("Failed to parse config file: {}", e)))
    }

    /// Save configuration to the config file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrackError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TrackError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| TrackError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| TrackError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("route-replay")
            .join("config.json"))
    }

    pub fn densification_policy(&self) -> Result<DensificationPolicy> {
        DensificationPolicy::new(self.target_spacing_m)
    }

    pub fn duration_policy(&self) -> Result<DurationPolicy> {
        let policy = match self.speed_multiplier {
            Some(speed_multiplier) => DurationPolicy::RateControl {
                base_ms_per_point: self.base_ms_per_point,
                speed_multiplier,
            },
            None => DurationPolicy::FixedDuration {
                total_duration_secs: self.animation_duration_secs,
            },
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn pacing_mode(&self) -> Result<PacingMode> {
        let mode = match self.pacing {
            PacingKind::Fixed => PacingMode::FixedRate,
            PacingKind::Distance => PacingMode::DistanceWeighted {
                intensity: self.intensity,
            },
        };
        mode.validate()?;
        Ok(mode)
    }

    /// Play for a fixed total duration
    pub fn update_duration(&mut self, seconds: f64) {
        self.animation_duration_secs = seconds;
        self.speed_multiplier = None;
    }

    /// Play at a rate relative to the base delay per point
    pub fn update_speed(&mut self, multiplier: f64) {
        self.speed_multiplier = Some(multiplier);
    }

    pub fn update_spacing(&mut self, meters: f64) {
        self.target_spacing_m = meters;
    }

    pub fn update_pacing(&mut self, pacing: PacingKind, intensity: Option<f64>) {
        self.pacing = pacing;
        if let Some(intensity) = intensity {
            self.intensity = intensity;
        }
    }
}
