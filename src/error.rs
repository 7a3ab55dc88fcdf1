// src/error.rs
//! Error types for track processing and playback

use std::fmt;

pub type Result<T> = std::result::Result<T, TrackError>;

#[derive(Debug)]
pub enum TrackError {
    /// Zero-length input where at least one point is required
    EmptyTrack,
    /// Non-positive or non-finite spacing/duration configuration
    InvalidPolicy(String),
    /// Operation called in a playback phase that forbids it
    InvalidState {
        operation: &'static str,
        phase: &'static str,
    },
    /// Not enough timestamped points for time-based metrics
    InsufficientData(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Parse(String),
    Other(String),
}

impl TrackError {
    /// Soft condition callers are expected to handle (e.g. a track without timestamps)
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, TrackError::InsufficientData(_))
    }
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::EmptyTrack => write!(f, "Track contains no points"),
            TrackError::InvalidPolicy(msg) => write!(f, "Invalid policy: {}", msg),
            TrackError::InvalidState { operation, phase } => {
                write!(f, "Invalid state: cannot {} while {}", operation, phase)
            }
            TrackError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            TrackError::Io(e) => write!(f, "IO error: {}", e),
            TrackError::Json(e) => write!(f, "JSON error: {}", e),
            TrackError::Parse(msg) => write!(f, "Parse error: {}", msg),
            TrackError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for TrackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TrackError::Io(e) => Some(e),
            TrackError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TrackError {
    fn from(error: std::io::Error) -> Self {
        TrackError::Io(error)
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(error: serde_json::Error) -> Self {
        TrackError::Json(error)
    }
}

impl From<gpx::errors::GpxError> for TrackError {
    fn from(error: gpx::errors::GpxError) -> Self {
        TrackError::Parse(format!("GPX: {}", error))
    }
}

impl From<anyhow::Error> for TrackError {
    fn from(error: anyhow::Error) -> Self {
        TrackError::Other(error.to_string())
    }
}
