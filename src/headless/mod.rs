//! Headless mode for automated runs
//!
//! Plays a full room (controller plus one session per participant) without
//! any graphical output, suitable for automated testing and balance runs.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless match_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "players": ["Hector", "Paris"],
//!   "join_offsets_ms": [0, 2500],
//!   "random_seed": 42,
//!   "max_duration_secs": 420
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{HeadlessConfigError, HeadlessMatchConfig};
pub use runner::{
    build_headless_app, run_headless_match, run_headless_match_with, HeadlessError,
    HeadlessPlugin, HeadlessReport,
};
