//! Combat Systems API
//!
//! Bevy wiring for the simulation. Systems run in three ordered phases each
//! frame:
//!
//! 1. **Inbound** - controller timers and broadcast delivery
//! 2. **Simulation** - session steps (entities, projectiles, bots, input)
//! 3. **Outbound** - intent routing and match-end checks
//!
//! `BattlePlugin` drives a single participant's `ClientSession` from events;
//! the headless runner reuses the same phases for a whole room.

use bevy::prelude::*;

use crate::lobby::protocol::{ClientIntent, ServerMessage};

use super::constants::NOMINAL_STEP_MS;
use super::match_flow::ClientSession;

/// System set labels for combat system ordering.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSystemPhase {
    /// Controller timers fire and broadcasts reach sessions
    Inbound,
    /// Sessions step their local simulation
    Simulation,
    /// Intents go back to the controller; match end is checked
    Outbound,
}

/// Configure the phase ordering. Call once per app.
pub fn configure_combat_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            CombatSystemPhase::Inbound,
            CombatSystemPhase::Simulation,
            CombatSystemPhase::Outbound,
        )
            .chain(),
    );
}

/// Simulated milliseconds per frame
#[derive(Resource, Clone, Copy, Debug)]
pub struct SimStep {
    pub delta_ms: u64,
}

impl Default for SimStep {
    fn default() -> Self {
        Self {
            delta_ms: NOMINAL_STEP_MS,
        }
    }
}

/// The participant this app plays as
#[derive(Resource)]
pub struct LocalSession(pub ClientSession);

/// A broadcast received from the controller
#[derive(Event, Clone, Debug)]
pub struct InboundMessage(pub ServerMessage);

/// An intent to send to the controller
#[derive(Event, Clone, Debug)]
pub struct OutboundIntent(pub ClientIntent);

pub struct BattlePlugin;

impl Plugin for BattlePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<InboundMessage>()
            .add_event::<OutboundIntent>()
            .init_resource::<SimStep>();

        configure_combat_system_ordering(app);

        app.add_systems(
            Update,
            (
                apply_inbound_messages.in_set(CombatSystemPhase::Inbound),
                step_local_session.in_set(CombatSystemPhase::Simulation),
            ),
        );
    }
}

fn apply_inbound_messages(
    mut inbound: EventReader<InboundMessage>,
    session: Option<ResMut<LocalSession>>,
) {
    let Some(mut session) = session else {
        inbound.clear();
        return;
    };
    for InboundMessage(message) in inbound.read() {
        session.0.handle(message);
    }
}

fn step_local_session(
    step: Res<SimStep>,
    session: Option<ResMut<LocalSession>>,
    mut outbound: EventWriter<OutboundIntent>,
) {
    let Some(mut session) = session else {
        return;
    };
    for intent in session.0.step(step.delta_ms) {
        outbound.send(OutboundIntent(intent));
    }
}
