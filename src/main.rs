//! TroyArena - 5v5 team arena battle
//!
//! Runs a whole room headless: the match controller plus one simulation per
//! participant, and prints each participant's result.

use std::process::ExitCode;

use troyarena::cli::parse_args;
use troyarena::headless::{run_headless_match, HeadlessMatchConfig};

fn main() -> ExitCode {
    let args = parse_args();

    let mut config = match args.headless.as_deref() {
        Some(path) => match HeadlessMatchConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => HeadlessMatchConfig::default(),
    };

    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(secs) = args.max_duration {
        config.max_duration_secs = secs;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }
    if let Some(path) = args.config {
        config.game_config_path = Some(path.to_string_lossy().into_owned());
    }

    match run_headless_match(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Headless match failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
