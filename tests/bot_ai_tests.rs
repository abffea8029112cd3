//! Integration tests for computer-controlled participants
//!
//! These tests verify that:
//! - Bot seats get stable ids and display names
//! - Target scoring favors the documented matchups
//! - Engagement keeps each weapon's preferred distance
//! - Wounded bots retreat without attacking

use bevy::prelude::Vec2;
use regex::Regex;

use troyarena::battle::combat_ai::{score_target, select_target};
use troyarena::battle::{
    Battlefield, BotBrain, CombatRole, Combatant, ControllerKind, Movement,
};
use troyarena::combat::GameRng;
use troyarena::config::{GameConfig, RoleStats, StatBlock};
use troyarena::lobby::roles::HeroType;
use troyarena::lobby::timers::MatchTimings;
use troyarena::lobby::MatchRegistry;

fn unit(id: &str, team: u8, role: CombatRole, stats: &StatBlock, at: Vec2) -> Combatant {
    Combatant::new(id, id, team, role, ControllerKind::Bot, at, stats)
}

fn soldier(id: &str, team: u8, x: f32) -> Combatant {
    unit(
        id,
        team,
        CombatRole::Soldier,
        &RoleStats::default().soldier,
        Vec2::new(x, 340.0),
    )
}

fn wizard(id: &str, team: u8, x: f32) -> Combatant {
    unit(
        id,
        team,
        CombatRole::Wizard,
        &RoleStats::default().wizard,
        Vec2::new(x, 340.0),
    )
}

fn hero(id: &str, team: u8, hero: HeroType, x: f32) -> Combatant {
    unit(
        id,
        team,
        CombatRole::Hero(hero),
        RoleStats::default().hero(hero),
        Vec2::new(x, 340.0),
    )
}

fn field(units: Vec<Combatant>) -> Battlefield {
    let mut field = Battlefield::new(GameConfig::default());
    for unit in units {
        field.spawn(unit);
    }
    field
}

// =============================================================================
// Identities
// =============================================================================

#[test]
fn test_bot_ids_and_names() {
    let mut registry = MatchRegistry::new(MatchTimings::default(), GameRng::from_seed(1));
    registry.join(0, "p1", "Hector").unwrap();
    registry.advance_to(10_000);

    let pattern = Regex::new(r"^bot_\d+_\d+$").unwrap();
    let lobby = registry.lobby(0).unwrap();
    let bots: Vec<_> = lobby.players().iter().filter(|p| p.is_bot).collect();
    assert_eq!(bots.len(), 9);
    for (n, bot) in bots.iter().enumerate() {
        assert!(pattern.is_match(&bot.id), "bad bot id {}", bot.id);
        assert_eq!(bot.id, format!("bot_0_{}", n));
        assert_eq!(bot.name, format!("Bot{}", n + 1));
    }
}

// =============================================================================
// Target scoring
// =============================================================================

#[test]
fn test_soldiers_prefer_non_heroes() {
    let me = soldier("me", 1, 500.0);
    let grunt = soldier("grunt", 2, 600.0);
    let champion = hero("champion", 2, HeroType::Achilles, 600.0);
    assert!(score_target(&me, &grunt) > score_target(&me, &champion));
}

#[test]
fn test_wounded_targets_score_higher() {
    let me = soldier("me", 1, 500.0);
    let fresh = soldier("fresh", 2, 600.0);
    let mut hurt = soldier("hurt", 2, 600.0);
    hurt.health = 20.0;
    let bonus = score_target(&me, &hurt) - score_target(&me, &fresh);
    assert!((bonus - 80.0).abs() < 1e-3, "missing-health bonus was {}", bonus);
}

#[test]
fn test_wizards_like_their_sweet_spot() {
    let me = wizard("me", 1, 200.0);
    let in_spot = soldier("in_spot", 2, 450.0);
    let close = soldier("close", 2, 240.0);
    // 250 away with the bonus beats 40 away without it
    let field = field(vec![me.clone(), close, in_spot]);
    assert_eq!(select_target(&field, &me).as_deref(), Some("in_spot"));
}

#[test]
fn test_dead_and_allied_units_are_never_targets() {
    let mut field = field(vec![
        soldier("me", 1, 500.0),
        soldier("friend", 1, 510.0),
        soldier("corpse", 2, 520.0),
    ]);
    field.die("corpse", None);
    let me = field.get("me").unwrap();
    assert_eq!(select_target(&field, me), None);
}

// =============================================================================
// Engagement
// =============================================================================

#[test]
fn test_ranged_bot_backs_off_when_crowded() {
    let mut field = field(vec![wizard("me", 1, 500.0), soldier("foe", 2, 600.0)]);
    let mut rng = GameRng::from_seed(3);
    let mut brain = BotBrain::new("me");

    let decision = brain.update(&mut field, &mut rng).unwrap();
    assert_eq!(brain.target(), Some("foe"));
    assert_eq!(decision.movement, Movement::Away(Vec2::new(600.0, 340.0)));
    assert!(decision.attack.is_some_and(|a| a.performed()));
}

#[test]
fn test_melee_bot_closes_distance() {
    let mut field = field(vec![soldier("me", 1, 500.0), soldier("foe", 2, 800.0)]);
    let mut rng = GameRng::from_seed(4);
    let mut brain = BotBrain::new("me");

    let decision = brain.update(&mut field, &mut rng).unwrap();
    assert_eq!(decision.movement, Movement::Toward(Vec2::new(800.0, 340.0)));
    assert!(decision.attack.is_some_and(|a| !a.performed()));
    assert_eq!(field.get("me").unwrap().velocity, Vec2::new(100.0, 0.0));
}

#[test]
fn test_bot_in_band_strafes_at_reduced_speed() {
    let mut field = field(vec![wizard("me", 1, 500.0), soldier("foe", 2, 800.0)]);
    let mut rng = GameRng::from_seed(5);
    let mut brain = BotBrain::new("me");

    let decision = brain.update(&mut field, &mut rng).unwrap();
    assert!(matches!(decision.movement, Movement::Strafe(_)));
    let velocity = field.get("me").unwrap().velocity;
    assert_eq!(velocity.x, 0.0);
    assert!((velocity.length() - 90.0 * 0.7).abs() < 1e-3);
}

#[test]
fn test_wounded_bot_retreats_to_a_teammate_without_attacking() {
    let mut field = field(vec![
        soldier("me", 1, 500.0),
        soldier("friend", 1, 200.0),
        soldier("foe", 2, 520.0),
    ]);
    field.take_damage("me", 130.0, Some("foe"));
    let mut rng = GameRng::from_seed(6);
    let mut brain = BotBrain::new("me");

    let decision = brain.update(&mut field, &mut rng).unwrap();
    assert!(brain.is_retreating());
    assert_eq!(decision.movement, Movement::Toward(Vec2::new(200.0, 340.0)));
    assert!(decision.attack.is_none());
    assert_eq!(field.get("foe").unwrap().damage_taken, 0.0);
}

#[test]
fn test_lone_wounded_bot_falls_back_to_spawn() {
    let mut field = field(vec![soldier("me", 2, 500.0), soldier("foe", 1, 520.0)]);
    field.take_damage("me", 130.0, None);
    let mut rng = GameRng::from_seed(7);
    let mut brain = BotBrain::new("me");

    let decision = brain.update(&mut field, &mut rng).unwrap();
    assert_eq!(decision.movement, Movement::Toward(Vec2::new(1050.0, 340.0)));
}

#[test]
fn test_target_lock_holds_for_two_seconds() {
    let mut field = field(vec![
        soldier("me", 1, 500.0),
        soldier("first", 2, 700.0),
        soldier("second", 2, 900.0),
    ]);
    let mut rng = GameRng::from_seed(8);
    let mut brain = BotBrain::new("me");
    brain.update(&mut field, &mut rng);
    assert_eq!(brain.target(), Some("first"));

    // A juicier target appears but the lock holds
    field.take_damage("second", 140.0, None);
    field.step(1_000);
    brain.update(&mut field, &mut rng);
    assert_eq!(brain.target(), Some("first"));

    field.step(1_000);
    brain.update(&mut field, &mut rng);
    assert_eq!(brain.target(), Some("second"));
}

#[test]
fn test_reselecting_the_same_target_does_not_extend_the_lock() {
    let mut field = field(vec![
        soldier("me", 1, 500.0),
        soldier("first", 2, 1050.0),
        soldier("second", 2, 1150.0),
    ]);
    let mut rng = GameRng::from_seed(9);
    let mut brain = BotBrain::new("me");
    brain.update(&mut field, &mut rng);
    assert_eq!(brain.target(), Some("first"));

    // Lock expires and the same target wins again
    field.step(2_000);
    brain.update(&mut field, &mut rng);
    assert_eq!(brain.target(), Some("first"));

    // The next decision is free to switch
    field.take_damage("second", 140.0, None);
    field.step(200);
    brain.update(&mut field, &mut rng);
    assert_eq!(brain.target(), Some("second"));
}
