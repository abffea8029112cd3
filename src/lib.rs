//! TroyArena - 5v5 Team Arena Battle
//!
//! A match controller that seats participants, fills rooms with bots, runs
//! captain-led role selection and times the battle, plus the per-participant
//! combat simulation (abilities, projectiles, bot AI) that resolves the
//! fight locally from relayed intents.
//!
//! This library exposes the core game modules for testing and reuse.

pub mod battle;
pub mod cli;
pub mod combat;
pub mod config;
pub mod headless;
pub mod lobby;

// Re-export commonly used types
pub use battle::{Battlefield, ClientSession, Combatant};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use config::GameConfig;
pub use headless::{HeadlessMatchConfig, HeadlessReport};
pub use lobby::protocol::{ClientIntent, ServerMessage};
pub use lobby::MatchRegistry;
