#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a District Siege level headlessly.

mod autopilot;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use district_siege_core::{AssetLoad, Landmark, CHECKPOINT_KEY};
use district_siege_debug_menu::DebugAction;
use district_siege_world::{Level, LevelConfig, MemorySessionStore};

use crate::autopilot::{Autopilot, Outcome};

/// Plays the storm district level without a renderer, printing every event.
#[derive(Debug, Parser)]
#[command(name = "district-siege", version)]
struct CliArgs {
    /// TOML file overriding any part of the level configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for enemy placement.
    #[arg(long)]
    seed: Option<u64>,

    /// Checkpoint to resume from, as if it had been saved earlier in the session.
    #[arg(long)]
    resume_from: Option<u32>,

    /// Removes every presentation delay between phases.
    #[arg(long)]
    instant: bool,

    /// Simulated frame length in milliseconds.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Milliseconds the autopilot needs to defeat an enemy.
    #[arg(long, default_value_t = 500)]
    kill_interval_ms: u64,

    /// Frames simulated before giving up.
    #[arg(long, default_value_t = 20_000)]
    max_frames: u32,

    /// Outcome reported for the rescue target asset.
    #[arg(long, value_enum, default_value_t = RescueAsset::Ready)]
    rescue_asset: RescueAsset,

    /// Debug shortcut dispatched right after the level starts; repeatable.
    #[arg(long = "debug", value_enum)]
    debug_actions: Vec<DebugShortcut>,

    /// Suppresses the per-event listing.
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RescueAsset {
    Ready,
    Failed,
}

impl From<RescueAsset> for AssetLoad {
    fn from(asset: RescueAsset) -> Self {
        match asset {
            RescueAsset::Ready => AssetLoad::Ready,
            RescueAsset::Failed => AssetLoad::Failed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DebugShortcut {
    FinishAllDistricts,
    StartStorm,
    ReleaseRescueTarget,
    ForceComplete,
    AdvanceDistrict,
    TeleportRescue,
}

impl From<DebugShortcut> for DebugAction {
    fn from(shortcut: DebugShortcut) -> Self {
        match shortcut {
            DebugShortcut::FinishAllDistricts => DebugAction::FinishAllDistricts,
            DebugShortcut::StartStorm => DebugAction::StartStorm,
            DebugShortcut::ReleaseRescueTarget => DebugAction::ReleaseRescueTarget,
            DebugShortcut::ForceComplete => DebugAction::ForceComplete,
            DebugShortcut::AdvanceDistrict => DebugAction::AdvanceDistrict,
            DebugShortcut::TeleportRescue => DebugAction::Teleport(Landmark::Rescue),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<LevelConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read level config at {}", path.display()))?;
            toml::from_str::<LevelConfig>(&contents)
                .with_context(|| format!("failed to parse level config at {}", path.display()))?
        }
        None => LevelConfig::default(),
    };

    if args.instant {
        let instant = LevelConfig::instant();
        config.spawn.stagger_ms = instant.spawn.stagger_ms;
        config.pacing.advance_delay_ms = instant.pacing.advance_delay_ms;
        config.pacing.settle_delay_ms = instant.pacing.settle_delay_ms;
        config.pacing.rescue_fallback_ms = instant.pacing.rescue_fallback_ms;
    }
    if let Some(seed) = args.seed {
        config.spawn.rng_seed = seed;
    }

    Ok(config)
}

/// Entry point for the District Siege command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let config = load_config(&args)?;
    let mut session = MemorySessionStore::new();
    if let Some(checkpoint) = args.resume_from {
        session = session.with_entry(CHECKPOINT_KEY, checkpoint.to_string());
    }
    let mut level =
        Level::new(config, Box::new(session)).context("invalid level configuration")?;

    let mut autopilot = Autopilot::new(
        Duration::from_millis(args.frame_ms),
        Duration::from_millis(args.kill_interval_ms),
        args.rescue_asset.into(),
        !args.quiet,
    );
    let debug_actions: Vec<DebugAction> =
        args.debug_actions.iter().copied().map(DebugAction::from).collect();

    let outcome = autopilot.run(&mut level, &debug_actions, args.max_frames);
    match outcome {
        Outcome::Completed { frames, clock } => {
            println!(
                "level completed after {frames} frames ({:.1}s simulated)",
                clock.as_secs_f32()
            );
            Ok(())
        }
        Outcome::TimedOut { phase } => {
            anyhow::bail!(
                "level did not complete within {} frames; stuck in {phase:?}",
                args.max_frames
            )
        }
    }
}
