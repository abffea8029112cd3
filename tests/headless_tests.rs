//! Integration tests for headless match execution
//!
//! These tests verify that:
//! - Headless matches run to completion
//! - Match results are accessible programmatically
//! - Seeded RNG produces deterministic results
//! - The single-session bevy wiring turns broadcasts into intents

use bevy::prelude::*;

use troyarena::battle::systems::{InboundMessage, LocalSession, OutboundIntent};
use troyarena::battle::{BattlePlugin, ClientSession, CombatSystemPhase};
use troyarena::combat::GameRng;
use troyarena::config::GameConfig;
use troyarena::headless::{run_headless_match_with, HeadlessConfigError, HeadlessMatchConfig};
use troyarena::lobby::protocol::{ClientIntent, MatchResultLabel, ServerMessage, TeamRoles};
use troyarena::lobby::roles::RoleAssignment;
use troyarena::lobby::room::MatchPhase;

/// Helper to create a basic match config
fn create_config(players: Vec<&str>, seed: Option<u64>) -> HeadlessMatchConfig {
    HeadlessMatchConfig {
        players: players.into_iter().map(String::from).collect(),
        random_seed: seed,
        ..Default::default()
    }
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_from_json() {
    let config = HeadlessMatchConfig::from_json(
        r#"{
            "players": ["Hector", "Paris"],
            "join_offsets_ms": [0, 2500],
            "autopilot": false,
            "random_seed": 42,
            "max_duration_secs": 120
        }"#,
    )
    .unwrap();

    assert_eq!(config.players.len(), 2);
    assert_eq!(config.join_offset(1), 2_500);
    assert!(!config.autopilot);
    assert_eq!(config.random_seed, Some(42));
    assert_eq!(config.max_duration_ms(), 120_000);
}

#[test]
fn test_config_requires_players() {
    let result = HeadlessMatchConfig::from_json(r#"{ "players": [] }"#);
    assert!(matches!(result, Err(HeadlessConfigError::Invalid(_))));
}

// =============================================================================
// Full runs
// =============================================================================

#[test]
fn test_single_player_match_completes() {
    let report =
        run_headless_match_with(create_config(vec!["Hector"], Some(12345)), GameConfig::default(), false)
            .unwrap();

    assert_eq!(report.random_seed, Some(12345));
    assert_eq!(report.lobbies.len(), 1);
    assert_eq!(report.lobbies[0].real_players, 1);
    assert_eq!(report.lobbies[0].bots, 9);
    assert!(report.lobbies[0].phase >= MatchPhase::Battle);

    let me = &report.participants[0];
    assert_eq!(me.player_id, "player_1");
    assert_eq!(me.lobby_id, Some(0));
    assert_eq!(me.team, Some(1));
    assert!(me.role.is_some());
    assert!(!report.timed_out, "a full match fits in the default duration");
    assert!(me.outcome.is_some());

    assert!(report.combatants.len() >= 10);
    assert!(!report.combat_log.entries.is_empty());
    // Lobby wait, bot role assignment and countdown come first
    assert!(report.elapsed_ms > 21_000);
    assert!(report.elapsed_ms <= 21_000 + 240_000 + 100);
}

#[test]
fn test_seeded_matches_are_deterministic() {
    let first =
        run_headless_match_with(create_config(vec!["Hector"], Some(99)), GameConfig::default(), false)
            .unwrap();
    let second =
        run_headless_match_with(create_config(vec!["Hector"], Some(99)), GameConfig::default(), false)
            .unwrap();

    assert_eq!(first.elapsed_ms, second.elapsed_ms);
    assert_eq!(first.outcome_of("player_1"), second.outcome_of("player_1"));
    assert_eq!(first.combat_log.entries.len(), second.combat_log.entries.len());
}

#[test]
fn test_late_joiner_lands_in_the_same_room() {
    let mut config = create_config(vec!["Hector", "Paris"], Some(7));
    config.join_offsets_ms = vec![0, 2_500];
    let report = run_headless_match_with(config, GameConfig::default(), false).unwrap();

    assert_eq!(report.lobbies.len(), 1);
    assert_eq!(report.lobbies[0].real_players, 2);
    assert_eq!(report.participants[1].lobby_id, Some(0));
    assert_eq!(report.participants[1].team, Some(2));
}

#[test]
fn test_short_duration_times_out_before_battle() {
    let mut config = create_config(vec!["Hector"], Some(3));
    config.max_duration_secs = 5.0;
    let report = run_headless_match_with(config, GameConfig::default(), false).unwrap();

    assert!(report.timed_out);
    assert!(report.elapsed_ms >= 5_000);
    assert_eq!(report.outcome_of("player_1"), None);
    assert!(report.combatants.is_empty());
    assert_eq!(report.lobbies[0].phase, MatchPhase::Waiting);
}

#[test]
fn test_report_is_saved_as_json() {
    let path = std::env::temp_dir().join("troyarena_headless_report_test.json");
    let mut config = create_config(vec!["Hector"], Some(5));
    config.max_duration_secs = 1.0;
    config.output_path = Some(path.to_string_lossy().into_owned());
    run_headless_match_with(config, GameConfig::default(), false).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["random_seed"], 5);
    assert_eq!(saved["timed_out"], true);
    assert_eq!(saved["participants"][0]["player_id"], "player_1");
    let _ = std::fs::remove_file(&path);
}

// =============================================================================
// Single-session plugin
// =============================================================================

#[derive(Resource, Default)]
struct Collected(Vec<ClientIntent>);

fn collect_intents(mut outbound: EventReader<OutboundIntent>, mut collected: ResMut<Collected>) {
    collected.0.extend(outbound.read().map(|OutboundIntent(i)| i.clone()));
}

#[test]
fn test_battle_plugin_reports_own_death() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(BattlePlugin)
        .init_resource::<Collected>()
        .insert_resource(LocalSession(ClientSession::new(
            "me",
            "Hector",
            GameConfig::default(),
            GameRng::from_seed(1),
        )))
        .add_systems(Update, collect_intents.in_set(CombatSystemPhase::Outbound));

    let mut roles = TeamRoles::default();
    roles.team1.insert("me".into(), RoleAssignment::soldier());
    roles.team2.insert("bot_0_0".into(), RoleAssignment::soldier());
    app.world_mut().send_event(InboundMessage(ServerMessage::BattleStarted {
        roles,
        team1: vec!["me".into()],
        team2: vec!["bot_0_0".into()],
        bots: vec!["bot_0_0".into()],
    }));
    app.update();
    assert!(app.world().resource::<LocalSession>().0.in_battle());

    app.world_mut()
        .resource_mut::<LocalSession>()
        .0
        .battlefield_mut()
        .unwrap()
        .die("me", Some("bot_0_0"));
    app.update();

    let collected = &app.world().resource::<Collected>().0;
    assert!(collected.contains(&ClientIntent::PlayerDeath {
        killer_id: Some("bot_0_0".into())
    }));
    assert_eq!(
        app.world().resource::<LocalSession>().0.outcome(),
        Some(MatchResultLabel::Lose)
    );
}
