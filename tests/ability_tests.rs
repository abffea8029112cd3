//! Integration tests for hero abilities
//!
//! These tests verify that:
//! - Each hero's ability has the documented effect
//! - Preconditions (cooldown, death, freeze, living clone) block use
//! - Only locally controlled casters report their abilities
//! - Remote reports replay heal and aegis but not clone or rage

use bevy::prelude::Vec2;

use troyarena::battle::{
    AbilityBlocked, AbilityOutcome, Battlefield, CombatRole, Combatant, ControllerKind,
};
use troyarena::combat::{CombatLogEventType, SimReport};
use troyarena::config::{GameConfig, RoleStats};
use troyarena::lobby::protocol::AbilityKind;
use troyarena::lobby::roles::HeroType;

fn hero(id: &str, team: u8, hero: HeroType, x: f32) -> Combatant {
    Combatant::new(
        id,
        hero.name(),
        team,
        CombatRole::Hero(hero),
        ControllerKind::Human,
        Vec2::new(x, 340.0),
        RoleStats::default().hero(hero),
    )
}

fn soldier(id: &str, team: u8, x: f32) -> Combatant {
    Combatant::new(
        id,
        id,
        team,
        CombatRole::Soldier,
        ControllerKind::Bot,
        Vec2::new(x, 340.0),
        &RoleStats::default().soldier,
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
// Effects
// =============================================================================

#[test]
fn test_clone_copies_three_quarters_of_its_master() {
    let mut field = field(vec![hero("a", 1, HeroType::Achilles, 300.0)]);
    assert_eq!(field.use_ability("a"), AbilityOutcome::Used(AbilityKind::Clone));

    let clone = field.get("a_clone_1").unwrap();
    assert_eq!(clone.name, "Achilles's Clone");
    assert_eq!(clone.team, 1);
    assert!(clone.is_clone());
    assert!(clone.is_bot());
    assert_eq!(clone.max_health, 56.25);
    assert_eq!(clone.damage, 112.5);
    assert_eq!(clone.position, Vec2::new(330.0, 340.0));
}

#[test]
fn test_heal_restores_half_the_casters_max_health_to_teammates() {
    let mut field = field(vec![
        hero("g", 1, HeroType::Agamemnon, 300.0),
        soldier("s1", 1, 320.0),
        soldier("s2", 1, 340.0),
        soldier("foe", 2, 900.0),
    ]);
    field.take_damage("s1", 140.0, Some("foe"));
    field.take_damage("s2", 60.0, Some("foe"));
    field.take_damage("foe", 120.0, None);

    assert_eq!(field.use_ability("g"), AbilityOutcome::Used(AbilityKind::Heal));
    assert_eq!(field.get("s1").unwrap().health, 60.0);
    assert_eq!(field.get("s2").unwrap().health, 100.0);
    assert_eq!(field.get("foe").unwrap().health, 30.0, "enemies are not healed");
    assert_eq!(field.get("g").unwrap().healing_done, 60.0);
    assert_eq!(field.log.filter_by_type(CombatLogEventType::Healing).len(), 2);
}

#[test]
fn test_aegis_freezes_every_enemy_at_any_distance() {
    let mut field = field(vec![
        hero("o", 1, HeroType::Odysseus, 100.0),
        soldier("ally", 1, 150.0),
        soldier("near", 2, 300.0),
        soldier("far", 2, 1200.0),
    ]);
    field.move_toward("far", Vec2::new(0.0, 340.0));

    assert_eq!(field.use_ability("o"), AbilityOutcome::Used(AbilityKind::Aegis));
    for id in ["near", "far"] {
        let c = field.get(id).unwrap();
        assert!(c.frozen, "{} should be frozen", id);
        assert_eq!(c.frozen_until_ms, 5_000);
    }
    assert!(!field.get("ally").unwrap().frozen);

    field.step(1_000);
    assert_eq!(field.get("far").unwrap().position.x, 1200.0);
    field.step(4_000);
    assert!(!field.get("far").unwrap().frozen);
    assert_eq!(field.log.freeze_ms_on("far"), 5_000);
}

#[test]
fn test_rage_raises_damage_for_eight_seconds() {
    let mut field = field(vec![hero("m", 1, HeroType::Menelaus, 300.0)]);
    field.use_ability("m");
    assert_eq!(field.get("m").unwrap().damage, 150.0);
    field.step(8_000);
    assert_eq!(field.get("m").unwrap().damage, 100.0);
    assert!(field.get("m").unwrap().rage.is_none());
}

// =============================================================================
// Preconditions
// =============================================================================

#[test]
fn test_second_clone_waits_for_the_first_to_die() {
    let mut field = field(vec![hero("a", 1, HeroType::Achilles, 300.0)]);
    field.use_ability("a");
    field.step(45_000);
    assert_eq!(
        field.use_ability("a"),
        AbilityOutcome::NotPerformed(AbilityBlocked::CloneAlive)
    );

    field.die("a_clone_1", None);
    assert_eq!(field.use_ability("a"), AbilityOutcome::Used(AbilityKind::Clone));
    assert!(field.get("a_clone_2").is_some_and(|c| c.alive));
}

#[test]
fn test_blocked_casters() {
    let mut field = field(vec![
        soldier("s", 1, 100.0),
        hero("dead", 1, HeroType::Menelaus, 200.0),
        hero("cold", 1, HeroType::Agamemnon, 300.0),
    ]);
    field.die("dead", None);
    field.freeze("cold", 1_000, None);

    assert_eq!(
        field.use_ability("s"),
        AbilityOutcome::NotPerformed(AbilityBlocked::NoAbility)
    );
    assert_eq!(
        field.use_ability("dead"),
        AbilityOutcome::NotPerformed(AbilityBlocked::Dead)
    );
    assert_eq!(
        field.use_ability("cold"),
        AbilityOutcome::NotPerformed(AbilityBlocked::Frozen)
    );
    assert_eq!(
        field.use_ability("nobody"),
        AbilityOutcome::NotPerformed(AbilityBlocked::UnknownCombatant)
    );
}

#[test]
fn test_cooldown_remaining_counts_down() {
    let mut field = field(vec![hero("o", 1, HeroType::Odysseus, 100.0)]);
    field.use_ability("o");
    field.step(10_000);
    let o = field.get("o").unwrap();
    assert_eq!(o.ability_cooldown_remaining_ms(field.now_ms()), 20_000);
    field.step(20_000);
    assert!(field.can_use_ability("o"));
}

// =============================================================================
// Reports and replay
// =============================================================================

#[test]
fn test_only_local_casters_report() {
    let mut field = Battlefield::new(GameConfig::default());
    field.spawn(hero("me", 1, HeroType::Menelaus, 100.0).with_local_control(true));
    field.spawn(hero("them", 2, HeroType::Menelaus, 900.0));

    field.use_ability("me");
    field.use_ability("them");
    let reports = field.drain_reports();
    assert_eq!(reports.len(), 1);
    assert!(matches!(
        &reports[0],
        SimReport::AbilityUsed { caster, kind: AbilityKind::Rage, .. } if caster == "me"
    ));
}

#[test]
fn test_remote_heal_and_aegis_are_replayed() {
    let mut field = field(vec![
        hero("g", 1, HeroType::Agamemnon, 100.0),
        soldier("s", 1, 150.0),
        hero("o", 2, HeroType::Odysseus, 900.0),
    ]);
    field.take_damage("s", 100.0, None);

    assert!(field.apply_remote_ability("g", AbilityKind::Heal));
    assert_eq!(field.get("s").unwrap().health, 100.0);
    assert!(field.apply_remote_ability("o", AbilityKind::Aegis));
    assert!(field.get("g").unwrap().frozen);
    assert!(field.get("s").unwrap().frozen);
    assert!(field.drain_reports().is_empty());
}

#[test]
fn test_remote_clone_is_not_reconstructed() {
    let mut field = field(vec![hero("a", 1, HeroType::Achilles, 300.0)]);
    assert!(!field.apply_remote_ability("a", AbilityKind::Clone));
    assert!(field.living_clones_of("a").is_empty());
    assert_eq!(field.combatants().len(), 1);
}
