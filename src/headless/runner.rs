//! Headless match execution
//!
//! Plays a whole room without any graphical output: the controller and every
//! participant session live in one bevy `App`, connected by in-memory message
//! passing. Each update advances a simulated millisecond clock by one step.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::battle::systems::{configure_combat_system_ordering, CombatSystemPhase, SimStep};
use crate::battle::ClientSession;
use crate::combat::{CombatLog, GameRng};
use crate::config::{ConfigError, GameConfig, DEFAULT_CONFIG_PATH};
use crate::lobby::protocol::{
    Audience, ClientIntent, Envelope, LobbyId, MatchResultLabel, PlayerId, ServerMessage,
};
use crate::lobby::roles::RoleAssignment;
use crate::lobby::room::MatchPhase;
use crate::lobby::MatchRegistry;

use super::config::{HeadlessConfigError, HeadlessMatchConfig};

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error(transparent)]
    Config(#[from] HeadlessConfigError),
    #[error(transparent)]
    GameConfig(#[from] ConfigError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("headless app stopped without a report")]
    NoReport,
}

/// Simulated clock shared by the controller and every session
#[derive(Resource, Default, Clone, Copy, Debug)]
pub struct SimClock {
    pub now_ms: u64,
}

pub struct Participant {
    pub session: ClientSession,
    pub join_at_ms: u64,
    pub joined: bool,
}

/// Every session in the run, plus intents waiting to reach the controller
#[derive(Resource, Default)]
pub struct Participants {
    pub entries: Vec<Participant>,
    pending: Vec<(PlayerId, ClientIntent)>,
}

/// Resource to track headless match state
#[derive(Resource)]
pub struct HeadlessMatchState {
    pub max_duration_ms: u64,
    pub output_path: Option<String>,
    pub complete: bool,
    pub random_seed: Option<u64>,
    /// Result announced by the controller, if any (only ever the timeout draw)
    pub controller_result: Option<MatchResultLabel>,
    pub report: Option<HeadlessReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbySummary {
    pub lobby_id: LobbyId,
    pub phase: MatchPhase,
    pub real_players: usize,
    pub bots: usize,
}

/// One participant's view of how the match ended
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResult {
    pub player_id: PlayerId,
    pub name: String,
    pub lobby_id: Option<LobbyId>,
    pub team: Option<u8>,
    pub role: Option<RoleAssignment>,
    pub outcome: Option<MatchResultLabel>,
}

/// Statistics for a single combatant after the match
#[derive(Debug, Clone, Serialize)]
pub struct CombatantResult {
    pub id: String,
    pub name: String,
    pub team: u8,
    pub role: String,
    pub max_health: f32,
    /// Health remaining at match end (0 if dead)
    pub final_health: f32,
    pub survived: bool,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
    pub killing_blows: usize,
}

/// Result of a completed headless run
///
/// Combatant statistics and the combat log come from the first participant's
/// simulation; other participants may have seen a different battle.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlessReport {
    pub random_seed: Option<u64>,
    pub elapsed_ms: u64,
    pub timed_out: bool,
    pub controller_result: Option<MatchResultLabel>,
    pub lobbies: Vec<LobbySummary>,
    pub participants: Vec<ParticipantResult>,
    pub combatants: Vec<CombatantResult>,
    pub combat_log: CombatLog,
}

impl HeadlessReport {
    pub fn outcome_of(&self, player: &str) -> Option<MatchResultLabel> {
        self.participants
            .iter()
            .find(|p| p.player_id == player)
            .and_then(|p| p.outcome)
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), HeadlessError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| HeadlessError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Plugin for headless match execution
pub struct HeadlessPlugin {
    pub config: HeadlessMatchConfig,
    pub game_config: GameConfig,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let mut master = match self.config.random_seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                GameRng::from_entropy()
            }
        };

        let registry = MatchRegistry::new(self.game_config.timings, master.fork());
        let entries = self
            .config
            .players
            .iter()
            .enumerate()
            .map(|(i, name)| Participant {
                session: ClientSession::new(
                    format!("player_{}", i + 1),
                    name.clone(),
                    self.game_config.clone(),
                    master.fork(),
                )
                .with_autopilot(self.config.autopilot),
                join_at_ms: self.config.join_offset(i),
                joined: false,
            })
            .collect();

        app.insert_resource(registry)
            .insert_resource(Participants {
                entries,
                pending: Vec::new(),
            })
            .insert_resource(HeadlessMatchState {
                max_duration_ms: self.config.max_duration_ms(),
                output_path: self.config.output_path.clone(),
                complete: false,
                random_seed: self.config.random_seed,
                controller_result: None,
                report: None,
            })
            .init_resource::<SimClock>()
            .init_resource::<SimStep>();

        configure_combat_system_ordering(app);

        app.add_systems(
            Update,
            (
                (
                    advance_clock,
                    admit_participants,
                    fire_controller_timers,
                    deliver_broadcasts,
                )
                    .chain()
                    .in_set(CombatSystemPhase::Inbound),
                step_sessions.in_set(CombatSystemPhase::Simulation),
                (route_intents, check_match_end)
                    .chain()
                    .in_set(CombatSystemPhase::Outbound),
            ),
        )
        .add_systems(PostUpdate, exit_on_complete);
    }
}

fn advance_clock(step: Res<SimStep>, state: Res<HeadlessMatchState>, mut clock: ResMut<SimClock>) {
    if !state.complete {
        clock.now_ms += step.delta_ms;
    }
}

fn admit_participants(
    clock: Res<SimClock>,
    mut registry: ResMut<MatchRegistry>,
    mut participants: ResMut<Participants>,
) {
    for participant in participants.entries.iter_mut() {
        if participant.joined || participant.join_at_ms > clock.now_ms {
            continue;
        }
        let player = participant.session.player_id().to_string();
        let intent = participant.session.join_intent();
        if let Err(e) = registry.handle_intent(clock.now_ms, &player, intent) {
            warn!("{} could not join: {}", player, e);
        }
        participant.joined = true;
    }
}

fn fire_controller_timers(clock: Res<SimClock>, mut registry: ResMut<MatchRegistry>) {
    registry.advance_to(clock.now_ms);
}

/// Whether `envelope` is addressed to this session. A session learns its
/// lobby from the `lobby_joined` sent to it alone.
fn addressed_to(envelope: &Envelope, session: &ClientSession) -> bool {
    match session.lobby_id() {
        Some(lobby_id) => envelope.reaches(lobby_id, session.player_id()),
        None => matches!(&envelope.audience, Audience::Player(only) if only == session.player_id()),
    }
}

fn deliver_broadcasts(
    mut registry: ResMut<MatchRegistry>,
    mut participants: ResMut<Participants>,
    mut state: ResMut<HeadlessMatchState>,
) {
    for envelope in registry.drain_outbox() {
        if let ServerMessage::GameEnded { result } = &envelope.message {
            state.controller_result = Some(*result);
        }
        for participant in participants.entries.iter_mut() {
            if addressed_to(&envelope, &participant.session) {
                participant.session.handle(&envelope.message);
            }
        }
    }
}

fn step_sessions(step: Res<SimStep>, mut participants: ResMut<Participants>) {
    let Participants { entries, pending } = &mut *participants;
    for participant in entries.iter_mut().filter(|p| p.joined) {
        let player = participant.session.player_id().to_string();
        pending.extend(
            participant
                .session
                .step(step.delta_ms)
                .into_iter()
                .map(|intent| (player.clone(), intent)),
        );
    }
}

fn route_intents(
    clock: Res<SimClock>,
    mut registry: ResMut<MatchRegistry>,
    mut participants: ResMut<Participants>,
) {
    for (sender, intent) in std::mem::take(&mut participants.pending) {
        // Rejections are logged by the registry and dropped
        let _ = registry.handle_intent(clock.now_ms, &sender, intent);
    }
}

/// Finish once every session has a result label, or on timeout
fn check_match_end(
    clock: Res<SimClock>,
    registry: Res<MatchRegistry>,
    participants: Res<Participants>,
    mut state: ResMut<HeadlessMatchState>,
) {
    if state.complete {
        return;
    }
    let decided = participants
        .entries
        .iter()
        .all(|p| p.session.outcome().is_some());
    let timed_out = clock.now_ms >= state.max_duration_ms;
    if !decided && !timed_out {
        return;
    }

    if decided {
        info!("All participants decided after {}ms", clock.now_ms);
    } else {
        info!("Headless run timed out after {}ms", clock.now_ms);
    }

    let report = build_report(&registry, &participants, &state, clock.now_ms, !decided);
    if let Some(path) = state.output_path.as_deref() {
        match report.save(Path::new(path)) {
            Ok(()) => println!("Match complete. Report saved to: {}", path),
            Err(e) => eprintln!("Failed to save report: {}", e),
        }
    }
    state.report = Some(report);
    state.complete = true;
}

fn build_report(
    registry: &MatchRegistry,
    participants: &Participants,
    state: &HeadlessMatchState,
    elapsed_ms: u64,
    timed_out: bool,
) -> HeadlessReport {
    let lobbies = registry
        .lobbies()
        .map(|lobby| LobbySummary {
            lobby_id: lobby.id,
            phase: lobby.phase(),
            real_players: lobby.real_player_count(),
            bots: lobby.player_count() - lobby.real_player_count(),
        })
        .collect();

    let results = participants
        .entries
        .iter()
        .map(|p| ParticipantResult {
            player_id: p.session.player_id().to_string(),
            name: p.session.name().to_string(),
            lobby_id: p.session.lobby_id(),
            team: p.session.team(),
            role: p.session.known_roles().get(p.session.player_id()).copied(),
            outcome: p.session.outcome(),
        })
        .collect();

    let observer = participants
        .entries
        .iter()
        .find_map(|p| p.session.battlefield());
    let combatants = observer
        .map(|field| {
            field
                .combatants()
                .iter()
                .map(|c| CombatantResult {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    team: c.team,
                    role: c.role.name().to_string(),
                    max_health: c.max_health,
                    final_health: c.health,
                    survived: c.alive,
                    damage_dealt: c.damage_dealt,
                    damage_taken: c.damage_taken,
                    healing_done: c.healing_done,
                    killing_blows: field.log.killing_blows_by(&c.id),
                })
                .collect()
        })
        .unwrap_or_default();
    let combat_log = observer.map(|field| field.log.clone()).unwrap_or_default();

    HeadlessReport {
        random_seed: state.random_seed,
        elapsed_ms,
        timed_out,
        controller_result: state.controller_result,
        lobbies,
        participants: results,
        combatants,
        combat_log,
    }
}

/// Exit the app when the match is complete
fn exit_on_complete(state: Res<HeadlessMatchState>, mut exit: EventWriter<AppExit>) {
    if state.complete {
        exit.send(AppExit::Success);
    }
}

/// Build the app without running it. `logging` installs `LogPlugin`, which
/// may only happen once per process.
pub fn build_headless_app(
    config: HeadlessMatchConfig,
    game_config: GameConfig,
    logging: bool,
) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    if logging {
        app.add_plugins(LogPlugin::default());
    }
    app.add_plugins(HeadlessPlugin {
        config,
        game_config,
    });
    app
}

/// Run a headless match to completion with an explicit game config
pub fn run_headless_match_with(
    config: HeadlessMatchConfig,
    game_config: GameConfig,
    logging: bool,
) -> Result<HeadlessReport, HeadlessError> {
    config.validate()?;
    game_config.validate()?;

    let mut app = build_headless_app(config, game_config, logging);
    app.finish();
    app.cleanup();
    while app.should_exit().is_none() {
        app.update();
    }

    app.world_mut()
        .resource_mut::<HeadlessMatchState>()
        .report
        .take()
        .ok_or(HeadlessError::NoReport)
}

/// Run a headless match with the given configuration
pub fn run_headless_match(config: HeadlessMatchConfig) -> Result<HeadlessReport, HeadlessError> {
    let game_config = match config.game_config_path.as_deref() {
        Some(path) => GameConfig::load_from_file(Path::new(path))?,
        None => GameConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    };

    println!("Starting headless match simulation...");
    println!("  Players: {:?}", config.players);
    println!("  Autopilot: {}", config.autopilot);
    println!("  Max duration: {:.0}s", config.max_duration_secs);

    let report = run_headless_match_with(config, game_config, true)?;
    for p in &report.participants {
        println!(
            "  {} ({}): {}",
            p.name,
            p.player_id,
            p.outcome
                .map(|o| format!("{:?}", o))
                .unwrap_or_else(|| "undecided".to_string())
        );
    }
    Ok(report)
}
