// src/player.rs
//! Drives a playback scheduler from a frame timer

use crate::{
    display::PlaybackDisplay,
    error::Result,
    playback::{DurationPolicy, PacingMode, PlaybackPhase, PlaybackScheduler, PlaybackSummary},
    track::Track,
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::time::{interval, MissedTickBehavior};

/// Roughly one tick per 60 Hz frame
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed(PlaybackSummary),
    Stopped { revealed_count: usize },
}

/// Runs playbacks on a timer, with shared flags for cancelling and pausing
pub struct Player {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    frame_interval: Duration,
}

impl Player {
    pub fn new() -> Self {
        Self::with_frame_interval(DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            paused: Arc::new(AtomicBool::new(false)),
            frame_interval,
        }
    }

    /// Stop the running playback whenever Ctrl+C is pressed
    pub fn stop_on_ctrl_c(&self) {
        let running = Arc::clone(&self.running);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                running.store(false, Ordering::Relaxed);
            }
        });
    }

    /// Play `track` to the end or until stopped, rendering every frame.
    ///
    /// The track and policies are validated before the display is touched.
    /// If playback fails after [`PlaybackDisplay::begin`], the display is
    /// restored with [`PlaybackDisplay::abort`] before the error is returned.
    /// A pending stop request is consumed by the playback it ends.
    pub async fn play<D: PlaybackDisplay>(
        &self,
        track: Track,
        policy: DurationPolicy,
        mode: PacingMode,
        display: &mut D,
    ) -> Result<PlaybackOutcome> {
        let mut scheduler = PlaybackScheduler::new();
        scheduler.start(track, policy, mode)?;

        let result = self.drive(&mut scheduler, display).await;
        self.running.store(true, Ordering::Relaxed);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(restore) = display.abort() {
                    tracing::warn!("failed to restore display: {}", restore);
                }
                return Err(e);
            }
        };
        tracing::debug!(?outcome, "playback finished");

        display.finish(&outcome)?;
        Ok(outcome)
    }

    async fn drive<D: PlaybackDisplay>(
        &self,
        scheduler: &mut PlaybackScheduler,
        display: &mut D,
    ) -> Result<PlaybackOutcome> {
        if let Some(sequence) = scheduler.sequence() {
            display.begin(sequence)?;
        }
        let done = scheduler.completion();

        let mut frames = interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let now = frames.tick().await.into_std();

            if !self.running.load(Ordering::Relaxed) {
                scheduler.stop();
                break;
            }

            let want_pause = self.paused.load(Ordering::Relaxed);
            match scheduler.phase() {
                PlaybackPhase::Running if want_pause => scheduler.pause()?,
                PlaybackPhase::Paused if !want_pause => scheduler.resume(now)?,
                _ => {}
            }

            let tick = scheduler.tick(now)?;
            display.render(scheduler, &tick)?;

            if tick.completed {
                break;
            }
        }

        Ok(match done.await {
            Ok(summary) => PlaybackOutcome::Completed(summary),
            Err(_) => PlaybackOutcome::Stopped {
                revealed_count: scheduler.revealed_count(),
            },
        })
    }

    /// Request cancellation of the current playback
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::terminal::TerminalDisplay;
    use crate::error::TrackError;
    use crate::playback::TickResult;
    use crate::track::TrackPoint;
    use std::io;

    #[derive(Default)]
    struct RecordingDisplay {
        begun: bool,
        counts: Vec<usize>,
        outcome: Option<PlaybackOutcome>,
        fail_render_at: Option<usize>,
        aborted: bool,
    }

    impl PlaybackDisplay for RecordingDisplay {
        fn begin(&mut self, _track: &Track) -> Result<()> {
            self.begun = true;
            Ok(())
        }

        fn render(&mut self, scheduler: &PlaybackScheduler, tick: &TickResult) -> Result<()> {
            assert_eq!(scheduler.revealed_points().len(), tick.revealed_count);
            if self.fail_render_at == Some(self.counts.len()) {
                return Err(TrackError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "display closed",
                )));
            }
            self.counts.push(tick.revealed_count);
            Ok(())
        }

        fn finish(&mut self, outcome: &PlaybackOutcome) -> Result<()> {
            self.outcome = Some(*outcome);
            Ok(())
        }

        fn abort(&mut self) -> Result<()> {
            self.aborted = true;
            Ok(())
        }
    }

    fn track(points: usize) -> Track {
        Track::new(
            (0..points)
                .map(|i| TrackPoint::new(50.0, 14.0 + i as f64 * 0.0001, 200.0))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_play_to_completion() {
        let player = Player::with_frame_interval(Duration::from_millis(5));
        let mut display = RecordingDisplay::default();
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 0.1,
        };

        let outcome = player
            .play(track(5), policy, PacingMode::FixedRate, &mut display)
            .await
            .unwrap();

        match outcome {
            PlaybackOutcome::Completed(summary) => assert_eq!(summary.points_revealed, 5),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(display.begun);
        assert!(display.counts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(display.counts.last(), Some(&5));
        assert_eq!(display.outcome, Some(outcome));
    }

    #[tokio::test]
    async fn test_stopped_player_reports_stop() {
        let player = Player::with_frame_interval(Duration::from_millis(5));
        player.stop();
        let mut display = RecordingDisplay::default();
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 10.0,
        };

        let outcome = player
            .play(track(5), policy, PacingMode::FixedRate, &mut display)
            .await
            .unwrap();

        assert_eq!(outcome, PlaybackOutcome::Stopped { revealed_count: 0 });
        assert!(display.counts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_track_fails_before_rendering() {
        let player = Player::new();
        let mut display = RecordingDisplay::default();
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 1.0,
        };

        let result = player
            .play(Track::default(), policy, PacingMode::FixedRate, &mut display)
            .await;
        assert!(result.is_err());
        assert!(!display.begun);
        assert!(display.counts.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_policy_leaves_terminal_untouched() {
        let player = Player::new();
        let mut display = TerminalDisplay::with_writer(Vec::new());
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 0.0,
        };

        let result = player
            .play(track(2), policy, PacingMode::FixedRate, &mut display)
            .await;
        assert!(matches!(result, Err(TrackError::InvalidPolicy(_))));

        let output = display.into_inner();
        assert!(output.is_empty(), "terminal written to: {:?}", String::from_utf8_lossy(&output));
    }

    #[tokio::test]
    async fn test_render_failure_aborts_display() {
        let player = Player::with_frame_interval(Duration::from_millis(5));
        let mut display = RecordingDisplay {
            fail_render_at: Some(1),
            ..Default::default()
        };
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 1.0,
        };

        let result = player
            .play(track(5), policy, PacingMode::FixedRate, &mut display)
            .await;
        assert!(matches!(result, Err(TrackError::Io(_))));
        assert!(display.begun);
        assert!(display.aborted);
        assert!(display.outcome.is_none());
    }

    #[tokio::test]
    async fn test_player_reusable_after_stop() {
        let player = Player::with_frame_interval(Duration::from_millis(5));
        let policy = DurationPolicy::FixedDuration {
            total_duration_secs: 0.05,
        };

        player.stop();
        let first = player
            .play(track(3), policy, PacingMode::FixedRate, &mut RecordingDisplay::default())
            .await
            .unwrap();
        assert_eq!(first, PlaybackOutcome::Stopped { revealed_count: 0 });
        assert!(player.is_running());

        let second = player
            .play(track(3), policy, PacingMode::FixedRate, &mut RecordingDisplay::default())
            .await
            .unwrap();
        assert!(matches!(second, PlaybackOutcome::Completed(_)));
    }
}
