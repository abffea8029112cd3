//! JSON configuration parsing for headless mode
//!
//! A headless run seats the listed participants in the controller at their
//! join offsets and lets every session play its own side of the match.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::lobby::room::MAX_PLAYERS;

#[derive(Debug, Error)]
pub enum HeadlessConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid headless config: {0}")]
    Invalid(String),
}

/// Headless match configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlessMatchConfig {
    /// Display names of the real participants (1-10). Ids are `player_{n}`.
    pub players: Vec<String>,
    /// Milliseconds after start at which each participant joins. Missing
    /// entries join at 0.
    #[serde(default)]
    pub join_offsets_ms: Vec<u64>,
    /// Drive each participant's combatant with the bot engine and let
    /// captains assign roles
    #[serde(default = "default_autopilot")]
    pub autopilot: bool,
    /// Where to write the JSON report (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Maximum simulated duration in seconds, lobby wait included (default: 420)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Seed for a reproducible run
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// game.ron override (optional)
    #[serde(default)]
    pub game_config_path: Option<String>,
}

fn default_autopilot() -> bool {
    true
}

fn default_max_duration() -> f32 {
    420.0
}

impl Default for HeadlessMatchConfig {
    fn default() -> Self {
        Self {
            players: vec!["Player1".to_string()],
            join_offsets_ms: Vec::new(),
            autopilot: default_autopilot(),
            output_path: None,
            max_duration_secs: default_max_duration(),
            random_seed: None,
            game_config_path: None,
        }
    }
}

impl HeadlessMatchConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, HeadlessConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| HeadlessConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, HeadlessConfigError> {
        let config: HeadlessMatchConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HeadlessConfigError> {
        if self.players.is_empty() || self.players.len() > MAX_PLAYERS {
            return Err(HeadlessConfigError::Invalid(format!(
                "players must have 1-{} entries, got {}",
                MAX_PLAYERS,
                self.players.len()
            )));
        }
        if let Some(blank) = self.players.iter().position(|n| n.trim().is_empty()) {
            return Err(HeadlessConfigError::Invalid(format!(
                "player {} has an empty name",
                blank + 1
            )));
        }
        if self.join_offsets_ms.len() > self.players.len() {
            return Err(HeadlessConfigError::Invalid(format!(
                "{} join offsets for {} players",
                self.join_offsets_ms.len(),
                self.players.len()
            )));
        }
        if self.max_duration_secs.is_nan() || self.max_duration_secs <= 0.0 {
            return Err(HeadlessConfigError::Invalid(
                "max_duration_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn join_offset(&self, index: usize) -> u64 {
        self.join_offsets_ms.get(index).copied().unwrap_or(0)
    }

    pub fn max_duration_ms(&self) -> u64 {
        (self.max_duration_secs * 1000.0) as u64
    }
}
