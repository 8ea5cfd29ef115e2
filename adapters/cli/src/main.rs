#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays back a scripted level and prints every spawn.

mod playback;
mod script;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use maverick_spawns_level::Level;
use maverick_spawns_world::GameCamera;

use crate::{playback::Playback, script::Script};

/// Plays back a level file frame by frame.
#[derive(Debug, Parser)]
#[command(name = "maverick-spawns", version)]
struct Args {
    /// Level file containing `[[room]]` and `[[script]]` tables.
    level: PathBuf,
    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u32,
    /// Simulated duration of one frame, in milliseconds.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,
    /// Log trigger activity at debug level.
    #[arg(short, long)]
    verbose: bool,
}

/// Entry point for the Maverick spawn playback tool.
fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let contents = fs::read_to_string(&args.level)
        .with_context(|| format!("failed to read level file {}", args.level.display()))?;
    let level = Level::from_toml(&contents)
        .with_context(|| format!("invalid level file {}", args.level.display()))?;
    let script = Script::from_toml(&contents)
        .with_context(|| format!("invalid script in {}", args.level.display()))?;
    info!(
        "loaded {} rooms and {} scripted commands",
        level.room_names().count(),
        script.len()
    );

    let dt = Duration::from_millis(args.dt_ms);
    let mut playback = Playback::new(level, script, GameCamera::default());
    for frame in 0..args.frames {
        for event in playback.step(frame, dt)? {
            println!("frame {frame:>5}: {event}");
        }
    }
    println!(
        "{} frames played, {} entities alive",
        args.frames,
        playback.live_entities()
    );
    Ok(())
}
