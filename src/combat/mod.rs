//! Shared combat infrastructure
//!
//! Logging, simulation reports, and seeded randomness used by both the match
//! controller and the battle simulation.

pub mod events;
pub mod log;
pub mod rng;

pub use events::SimReport;
pub use log::{CombatLog, CombatLogEntry, CombatLogEventType, StructuredEventData};
pub use rng::GameRng;
