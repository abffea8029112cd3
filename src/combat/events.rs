//! Simulation reports
//!
//! Facts a simulation produces for its owner to broadcast. Only events about
//! locally controlled combatants are reported, so every death and ability
//! reaches the room exactly once.

use bevy::prelude::*;

use crate::lobby::protocol::AbilityKind;

/// Something the owning client must tell the room about
#[derive(Event, Debug, Clone, PartialEq)]
pub enum SimReport {
    /// A locally controlled combatant died
    Death {
        victim: String,
        killer: Option<String>,
    },
    /// A locally controlled combatant used its hero ability
    AbilityUsed {
        caster: String,
        kind: AbilityKind,
        position: Vec2,
    },
}

impl SimReport {
    /// Id of the combatant this report is about
    pub fn subject(&self) -> &str {
        match self {
            SimReport::Death { victim, .. } => victim,
            SimReport::AbilityUsed { caster, .. } => caster,
        }
    }
}
