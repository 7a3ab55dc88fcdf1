// src/main.rs
//! Route Replay - densify, summarize and replay GPX tracks in the terminal

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use route_replay::{
    config::{PacingKind, ReplayConfig},
    display::terminal::{render_summary, TerminalDisplay},
    track::{densify::DensityReport, gpx_file},
    PlaybackOutcome, Player, Track, TrackSummary,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "route-replay", version, about = "Densify, summarize and replay GPX tracks")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resample a track to a uniform point spacing
    Densify {
        input: PathBuf,
        /// Target distance between points in meters
        #[arg(long)]
        spacing: Option<f64>,
        /// Write the densified GPX here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print distance, elevation, time and calorie statistics
    Stats {
        input: PathBuf,
        /// Rider weight in kilograms
        #[arg(long)]
        weight: Option<f64>,
    },
    /// Replay a track in the terminal
    Play {
        input: PathBuf,
        /// Total playback duration in seconds
        #[arg(long, conflicts_with = "speed")]
        duration: Option<f64>,
        /// Speed multiplier over the base delay per point
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long, value_enum)]
        pacing: Option<PacingArg>,
        /// Exponent for distance-weighted pacing
        #[arg(long)]
        intensity: Option<f64>,
        /// Target spacing used when densifying before playback
        #[arg(long)]
        spacing: Option<f64>,
        /// Play the recorded points without densifying
        #[arg(long)]
        raw: bool,
    },
    /// Show or update the saved configuration
    Config {
        #[arg(long)]
        spacing: Option<f64>,
        #[arg(long)]
        duration: Option<f64>,
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long, value_enum)]
        pacing: Option<PacingArg>,
        #[arg(long)]
        intensity: Option<f64>,
        /// Densify tracks before playback
        #[arg(long)]
        densified: Option<bool>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PacingArg {
    Fixed,
    Distance,
}

impl From<PacingArg> for PacingKind {
    fn from(arg: PacingArg) -> Self {
        match arg {
            PacingArg::Fixed => PacingKind::Fixed,
            PacingArg::Distance => PacingKind::Distance,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match ReplayConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}, using defaults", e);
            ReplayConfig::default()
        }
    };

    match cli.command {
        Command::Densify {
            input,
            spacing,
            output,
        } => {
            if let Some(spacing) = spacing {
                config.update_spacing(spacing);
            }
            run_densify(&config, &input, output.as_deref())
        }
        Command::Stats { input, weight } => {
            let track = load(&input)?;
            let weight = weight.unwrap_or(config.weight_kg);
            print_summary(&track, weight)
        }
        Command::Play {
            input,
            duration,
            speed,
            pacing,
            intensity,
            spacing,
            raw,
        } => {
            if let Some(duration) = duration {
                config.update_duration(duration);
            }
            if let Some(speed) = speed {
                config.update_speed(speed);
            }
            if let Some(spacing) = spacing {
                config.update_spacing(spacing);
            }
            if pacing.is_some() || intensity.is_some() {
                let kind = pacing.map(PacingKind::from).unwrap_or(config.pacing);
                config.update_pacing(kind, intensity);
            }
            if raw {
                config.use_densified = false;
            }
            run_play(&config, &input).await
        }
        Command::Config {
            spacing,
            duration,
            speed,
            weight,
            pacing,
            intensity,
            densified,
        } => {
            let mut changed = false;
            if let Some(spacing) = spacing {
                config.update_spacing(spacing);
                changed = true;
            }
            if let Some(duration) = duration {
                config.update_duration(duration);
                changed = true;
            }
            if let Some(speed) = speed {
                config.update_speed(speed);
                changed = true;
            }
            if let Some(weight) = weight {
                config.weight_kg = weight;
                changed = true;
            }
            if pacing.is_some() || intensity.is_some() {
                let kind = pacing.map(PacingKind::from).unwrap_or(config.pacing);
                config.update_pacing(kind, intensity);
                changed = true;
            }
            if let Some(densified) = densified {
                config.use_densified = densified;
                changed = true;
            }

            if changed {
                // refuse to persist values playback would reject
                config.densification_policy()?;
                config.duration_policy()?;
                config.pacing_mode()?;
                config.save()?;
                println!("Saved {}", ReplayConfig::get_config_path()?.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: &Path) -> anyhow::Result<Track> {
    gpx_file::load_track(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn run_densify(config: &ReplayConfig, input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let policy = config.densification_policy()?;
    let track = load(input)?;
    let densified = route_replay::densify(&track, &policy)?;

    match output {
        Some(path) => gpx_file::save_track(&densified, path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => gpx_file::write_gpx(&densified, std::io::stdout().lock())?,
    }

    eprintln!(
        "Densified {} points to {} (target {}m)",
        track.len(),
        densified.len(),
        policy.target_spacing_m
    );
    if let Some(report) = DensityReport::from_track(&densified, policy.target_spacing_m) {
        eprintln!("{}", report);
    }
    Ok(())
}

fn print_summary(track: &Track, weight_kg: f64) -> anyhow::Result<()> {
    let summary = TrackSummary::from_track(track, weight_kg)?;
    let title = track.name.as_deref().unwrap_or("Track");
    render_summary(&mut std::io::stdout(), title, &summary)?;
    Ok(())
}

async fn run_play(config: &ReplayConfig, input: &Path) -> anyhow::Result<()> {
    let policy = config.duration_policy()?;
    let mode = config.pacing_mode()?;
    let track = load(input)?;

    let sequence = if config.use_densified {
        route_replay::densify(&track, &config.densification_policy()?)?
    } else {
        track.clone()
    };
    tracing::info!(points = sequence.len(), "starting playback");

    let player = Player::new();
    player.stop_on_ctrl_c();

    let mut display = TerminalDisplay::new();
    let outcome = player.play(sequence, policy, mode, &mut display).await?;

    if let PlaybackOutcome::Completed(_) = outcome {
        print_summary(&track, config.weight_kg)?;
    }
    Ok(())
}
