// src/lib.rs
//! Route Replay Library
//!
//! Densifies GPS tracks to a uniform point spacing, computes trip statistics
//! and paces the animated reveal of a track over wall-clock time.

pub mod config;
pub mod display;
pub mod error;
pub mod playback;
pub mod player;
pub mod track;

// Re-export main types for convenience
pub use error::{Result, TrackError};
pub use playback::{DurationPolicy, PacingMode, PlaybackPhase, PlaybackScheduler, TickResult};
pub use player::{PlaybackOutcome, Player};
pub use track::{densify, DensificationPolicy, Track, TrackPoint, TrackSummary};
