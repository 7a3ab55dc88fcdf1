// src/playback/mod.rs
//! Frame-rate independent playback of a growing track prefix
//!
//! The scheduler is driven from outside: the caller invokes
//! [`PlaybackScheduler::tick`] once per rendered frame (or timer callback)
//! and draws `sequence[..revealed_count]`. Elapsed wall-clock time is
//! accumulated and converted into revealed points by the active
//! [`PacingStrategy`], so large frame gaps catch up by revealing several
//! points in one tick.

pub mod pacing;

use crate::error::{Result, TrackError};
use crate::track::{Track, TrackPoint};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

pub use pacing::{build_strategy, DurationPolicy, PacingMode, PacingStrategy};

/// Slack for floating point drift when comparing accumulated time to a delay
const TIMING_EPSILON_MS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPhase {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl PlaybackPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackPhase::Completed | PlaybackPhase::Stopped)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Running => "running",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Completed => "completed",
            PlaybackPhase::Stopped => "stopped",
        }
    }
}

/// Outcome of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickResult {
    pub revealed_count: usize,
    pub total: usize,
    pub completed: bool,
}

impl TickResult {
    /// Revealed share of the sequence, 0..=100
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.revealed_count as f64 / self.total as f64 * 100.0).round() as u8
    }
}

/// Payload delivered once when a playback completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSummary {
    pub points_revealed: usize,
    /// Wall-clock time spent running, pauses excluded
    pub playback_time: Duration,
}

/// Mutable state of one playback run
#[derive(Debug)]
pub struct PlaybackState {
    sequence: Track,
    revealed_count: usize,
    elapsed_accumulator_ms: f64,
    last_tick: Option<Instant>,
    pacing: Box<dyn PacingStrategy>,
    next_delay_ms: Option<f64>,
    playback_time: Duration,
}

impl PlaybackState {
    fn new(sequence: Track, pacing: Box<dyn PacingStrategy>) -> Self {
        Self {
            sequence,
            revealed_count: 0,
            elapsed_accumulator_ms: 0.0,
            last_tick: None,
            pacing,
            next_delay_ms: None,
            playback_time: Duration::ZERO,
        }
    }

    /// Reveal as many points as the accumulated time pays for
    fn advance(&mut self) {
        let total = self.sequence.len();
        while self.revealed_count < total {
            let delay = match self.next_delay_ms {
                Some(delay) => delay,
                None => {
                    let delay = self.pacing.delay_ms(self.revealed_count);
                    self.next_delay_ms = Some(delay);
                    delay
                }
            };

            if self.elapsed_accumulator_ms + TIMING_EPSILON_MS < delay {
                break;
            }

            self.elapsed_accumulator_ms = (self.elapsed_accumulator_ms - delay).max(0.0);
            self.next_delay_ms = None;
            self.revealed_count += 1;
        }
    }

    fn result(&self) -> TickResult {
        let total = self.sequence.len();
        TickResult {
            revealed_count: self.revealed_count,
            total,
            completed: self.revealed_count == total,
        }
    }
}

/// Drives the reveal of a track prefix over wall-clock time.
///
/// State machine: `Idle -> Running <-> Paused`, ending in `Completed` or
/// `Stopped`. Not reentrant; all calls come from the loop that renders.
#[derive(Debug)]
pub struct PlaybackScheduler {
    phase: PlaybackPhase,
    state: Option<PlaybackState>,
    completion: Option<oneshot::Sender<PlaybackSummary>>,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self {
            phase: PlaybackPhase::Idle,
            state: None,
            completion: None,
        }
    }

    /// Begin revealing `sequence` from the first point.
    ///
    /// Allowed from `Idle` and from a terminal phase (replay).
    pub fn start(
        &mut self,
        sequence: Track,
        policy: DurationPolicy,
        mode: PacingMode,
    ) -> Result<()> {
        if matches!(self.phase, PlaybackPhase::Running | PlaybackPhase::Paused) {
            return Err(self.invalid("start"));
        }
        if sequence.is_empty() {
            return Err(TrackError::EmptyTrack);
        }

        let pacing = build_strategy(&sequence, &policy, &mode)?;
        tracing::debug!(
            points = sequence.len(),
            ?policy,
            ?mode,
            "playback started"
        );

        self.state = Some(PlaybackState::new(sequence, pacing));
        self.phase = PlaybackPhase::Running;
        Ok(())
    }

    /// Advance playback to `now`.
    ///
    /// The first tick after `start` only records the time. While paused the
    /// current count is returned unchanged.
    pub fn tick(&mut self, now: Instant) -> Result<TickResult> {
        match self.phase {
            PlaybackPhase::Running => {}
            PlaybackPhase::Paused => {
                if let Some(state) = &self.state {
                    return Ok(state.result());
                }
                return Err(self.invalid("tick"));
            }
            _ => return Err(self.invalid("tick")),
        }

        let Some(state) = self.state.as_mut() else {
            return Err(self.invalid("tick"));
        };

        let Some(last) = state.last_tick.replace(now) else {
            return Ok(state.result());
        };

        let delta = now.saturating_duration_since(last);
        state.playback_time += delta;
        state.elapsed_accumulator_ms += delta.as_secs_f64() * 1000.0;
        state.advance();

        let result = state.result();
        tracing::trace!(revealed = result.revealed_count, total = result.total, "tick");

        if result.completed {
            let summary = PlaybackSummary {
                points_revealed: state.revealed_count,
                playback_time: state.playback_time,
            };
            self.phase = PlaybackPhase::Completed;
            tracing::debug!(?summary, "playback completed");
            if let Some(sender) = self.completion.take() {
                // receiver may be gone; completion is still visible via phase
                let _ = sender.send(summary);
            }
        }

        Ok(result)
    }

    /// Freeze playback; ticks return the unchanged count until [`resume`](Self::resume)
    pub fn pause(&mut self) -> Result<()> {
        match self.phase {
            PlaybackPhase::Running => {
                self.phase = PlaybackPhase::Paused;
                tracing::debug!("playback paused");
                Ok(())
            }
            PlaybackPhase::Paused => Ok(()),
            _ => Err(self.invalid("pause")),
        }
    }

    /// Continue a paused playback; time starts counting again at `now`
    pub fn resume(&mut self, now: Instant) -> Result<()> {
        match self.phase {
            PlaybackPhase::Paused => {
                if let Some(state) = self.state.as_mut() {
                    state.last_tick = Some(now);
                }
                self.phase = PlaybackPhase::Running;
                tracing::debug!("playback resumed");
                Ok(())
            }
            PlaybackPhase::Running => Ok(()),
            _ => Err(self.invalid("resume")),
        }
    }

    /// Cancel playback. No-op in a terminal phase.
    pub fn stop(&mut self) {
        if self.phase.is_terminal() {
            return;
        }
        self.phase = PlaybackPhase::Stopped;
        // dropping the sender wakes the completion receiver with an error
        self.completion = None;
        tracing::debug!("playback stopped");
    }

    /// Discard the current run and return to `Idle`, e.g. when a new track loads
    pub fn reset(&mut self) {
        self.phase = PlaybackPhase::Idle;
        self.state = None;
        self.completion = None;
    }

    /// One-shot completion signal.
    ///
    /// Resolves with the summary when the playback completes, or with an
    /// error if it is stopped or reset first. Registering again replaces the
    /// previous receiver.
    pub fn completion(&mut self) -> oneshot::Receiver<PlaybackSummary> {
        let (sender, receiver) = oneshot::channel();

        match (&self.phase, &self.state) {
            (PlaybackPhase::Completed, Some(state)) => {
                let _ = sender.send(PlaybackSummary {
                    points_revealed: state.revealed_count,
                    playback_time: state.playback_time,
                });
            }
            _ => self.completion = Some(sender),
        }

        receiver
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == PlaybackPhase::Running
    }

    pub fn sequence(&self) -> Option<&Track> {
        self.state.as_ref().map(|s| &s.sequence)
    }

    pub fn revealed_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.revealed_count)
    }

    /// The prefix a renderer should currently draw
    pub fn revealed_points(&self) -> &[TrackPoint] {
        match &self.state {
            Some(state) => &state.sequence.points[..state.revealed_count],
            None => &[],
        }
    }

    pub fn elapsed_accumulator_ms(&self) -> f64 {
        self.state.as_ref().map_or(0.0, |s| s.elapsed_accumulator_ms)
    }

    fn invalid(&self, operation: &'static str) -> TrackError {
        TrackError::InvalidState {
            operation,
            phase: self.phase.name(),
        }
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}
