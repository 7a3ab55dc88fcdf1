// src/display/terminal.rs
//! Terminal-based playback and statistics display

use super::PlaybackDisplay;
use crate::{
    error::Result,
    player::PlaybackOutcome,
    playback::{PlaybackScheduler, TickResult},
    track::{metrics::format_hms, Track, TrackSummary},
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::io::{self, Write};

const BAR_WIDTH: usize = 40;

pub struct TerminalDisplay<W: Write = io::Stdout> {
    out: W,
    title: String,
    last_revealed: Option<usize>,
}

impl TerminalDisplay<io::Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            title: String::new(),
            last_revealed: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_header(&mut self) -> Result<()> {
        queue!(
            self.out,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print(format!("Route Replay - {}", self.title)),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n\n"),
            ResetColor
        )?;
        Ok(())
    }

    fn render_progress(&mut self, tick: &TickResult) -> Result<()> {
        let filled = if tick.total == 0 {
            0
        } else {
            tick.revealed_count * BAR_WIDTH / tick.total
        };

        queue!(
            self.out,
            SetForegroundColor(Color::Yellow),
            Print("PROGRESS:\n"),
            ResetColor,
            Print(format!(
                "  [{}{}] {:>3}%\n",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                tick.percent()
            )),
            Print(format!(
                "  Points:    {:>12} / {}\n\n",
                tick.revealed_count, tick.total
            ))
        )?;
        Ok(())
    }

    fn render_position(&mut self, scheduler: &PlaybackScheduler) -> Result<()> {
        queue!(
            self.out,
            SetForegroundColor(Color::Cyan),
            Print("POSITION:\n"),
            ResetColor
        )?;

        match scheduler.revealed_points().last() {
            Some(point) => {
                queue!(
                    self.out,
                    Print(format!("  Latitude:  {:>12.6}°\n", point.lat)),
                    Print(format!("  Longitude: {:>12.6}°\n", point.lon)),
                    Print(format!("  Elevation: {:>12.1} m\n", point.elevation_m))
                )?;
                if let Some(time) = point.timestamp {
                    queue!(
                        self.out,
                        Print(format!("  Recorded:  {}\n", time.format("%Y-%m-%d %H:%M:%S UTC")))
                    )?;
                }
            }
            None => queue!(self.out, Print("  Waiting for first point\n"))?,
        }

        queue!(self.out, Print("\n"))?;
        Ok(())
    }
}

impl Default for TerminalDisplay<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> PlaybackDisplay for TerminalDisplay<W> {
    fn begin(&mut self, track: &Track) -> Result<()> {
        self.title = track.name.clone().unwrap_or_else(|| "Untitled track".to_string());
        self.last_revealed = None;
        execute!(self.out, Hide, DisableLineWrap)?;
        Ok(())
    }

    fn render(&mut self, scheduler: &PlaybackScheduler, tick: &TickResult) -> Result<()> {
        // redraw only when something new was revealed
        if self.last_revealed == Some(tick.revealed_count) {
            return Ok(());
        }
        self.last_revealed = Some(tick.revealed_count);

        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        self.render_header()?;
        self.render_progress(tick)?;
        self.render_position(scheduler)?;
        queue!(
            self.out,
            SetForegroundColor(Color::Green),
            Print("Press Ctrl+C to stop\n"),
            ResetColor
        )?;

        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self, outcome: &PlaybackOutcome) -> Result<()> {
        execute!(self.out, Show, EnableLineWrap)?;

        let message = match outcome {
            PlaybackOutcome::Completed(summary) => format!(
                "\nPlayback complete: {} points in {:.1}s\n",
                summary.points_revealed,
                summary.playback_time.as_secs_f64()
            ),
            PlaybackOutcome::Stopped { revealed_count } => {
                format!("\nPlayback stopped after {} points\n", revealed_count)
            }
        };
        execute!(self.out, Print(message))?;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        execute!(self.out, Show, EnableLineWrap)?;
        Ok(())
    }
}

/// Print the trip statistics shown at the end of a replay
pub fn render_summary(out: &mut impl Write, title: &str, summary: &TrackSummary) -> Result<()> {
    execute!(
        out,
        SetForegroundColor(Color::Green),
        Print("=".repeat(60)),
        Print("\n"),
        Print(title),
        Print("\n"),
        Print("=".repeat(60)),
        Print("\n"),
        ResetColor
    )?;

    execute!(
        out,
        SetForegroundColor(Color::Yellow),
        Print("DISTANCE:\n"),
        ResetColor,
        Print(format!("  Distance:    {:>10.2} km\n", summary.distance_km)),
        Print(format!("  Points:      {:>10}\n", summary.points)),
        Print(format!("  Climb:       {:>10.0} m\n", summary.elevation.gain_m)),
        Print(format!("  Descent:     {:>10.0} m\n\n", summary.elevation.loss_m))
    )?;

    execute!(
        out,
        SetForegroundColor(Color::Cyan),
        Print("TIME:\n"),
        ResetColor
    )?;

    match summary.timing {
        Some(timing) => {
            execute!(
                out,
                Print(format!("  Moving time: {:>10}\n", format_hms(timing.moving_time_secs))),
                Print(format!("  Total time:  {:>10}\n", format_hms(timing.total_time_secs))),
                Print(format!("  Max speed:   {:>10.1} km/h\n", timing.max_speed_kmh))
            )?;
            if let (Some(moving), Some(total)) =
                (summary.moving_speed_kmh(), summary.total_speed_kmh())
            {
                execute!(
                    out,
                    Print(format!("  Avg speed:   {:>10.1} / {:.1} km/h (moving/total)\n", moving, total))
                )?;
            }
            if let Some(calories) = summary.calories {
                execute!(out, Print(format!("  Calories:    {:>10.0} kcal\n", calories)))?;
            }
        }
        None => execute!(out, Print("  No timing data in this track\n"))?,
    }

    execute!(out, Print("\n"))?;
    Ok(())
}
