//! Battle simulation
//!
//! Each participant runs its own copy of the fight. `Battlefield` resolves
//! movement, attacks, projectiles, abilities and deaths; `BotBrain` drives
//! bot-controlled combatants; `ClientSession` ties a simulation to the
//! controller's broadcasts and produces the participant's intents.

pub mod abilities;
pub mod combat_ai;
pub mod combat_core;
pub mod components;
pub mod constants;
pub mod hero_ai;
pub mod match_flow;
pub mod projectiles;
pub mod systems;

pub use abilities::{AbilityBlocked, AbilityOutcome};
pub use combat_ai::{BotBrain, BotDecision, Movement};
pub use combat_core::{AttackBlocked, AttackOutcome, Battlefield};
pub use components::{CombatRole, Combatant, CombatantId, ControllerKind, Weapon};
pub use match_flow::ClientSession;
pub use systems::{BattlePlugin, CombatSystemPhase, SimStep};
