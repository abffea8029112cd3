//! Command-line interface for TroyArena
//!
//! Every run is headless; without a config file a single autopiloted
//! participant plays against bots.

use clap::Parser;
use std::path::PathBuf;

/// 5v5 arena battle simulator
#[derive(Parser, Debug)]
#[command(name = "troyarena")]
#[command(about = "5v5 arena battle simulator")]
#[command(version)]
pub struct Args {
    /// Run the match described by this JSON config file
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: Option<PathBuf>,

    /// Output path for the JSON match report
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum simulated duration in seconds, lobby wait included
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<f32>,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// game.ron override (stats, timings, bot tuning)
    #[arg(long, value_name = "GAME_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
