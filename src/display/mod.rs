// src/display/mod.rs
//! Display modules for playback and trip statistics

pub mod terminal;

use crate::error::Result;
use crate::player::PlaybackOutcome;
use crate::playback::{PlaybackScheduler, TickResult};
use crate::track::Track;

/// Something that draws the revealed prefix of a playback
pub trait PlaybackDisplay {
    /// Called once before the first tick
    fn begin(&mut self, track: &Track) -> Result<()>;

    /// Called after every tick with the scheduler's current prefix
    fn render(&mut self, scheduler: &PlaybackScheduler, tick: &TickResult) -> Result<()>;

    /// Called once when playback completes or is stopped
    fn finish(&mut self, outcome: &PlaybackOutcome) -> Result<()>;

    /// Called instead of `finish` when playback fails after `begin`
    fn abort(&mut self) -> Result<()> {
        Ok(())
    }
}
