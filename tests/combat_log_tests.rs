//! Unit tests for combat log query and aggregation methods
//!
//! These tests verify that the CombatLog correctly:
//! - Aggregates damage by source
//! - Counts killing blows
//! - Tracks freeze duration
//! - Lists deaths in order and serializes its structured data

use troyarena::combat::log::{CombatLog, CombatLogEventType, StructuredEventData};

fn create_test_log() -> CombatLog {
    CombatLog::default()
}

// =============================================================================
// Damage Aggregation Tests
// =============================================================================

#[test]
fn test_damage_dealt_by_empty_log() {
    let log = create_test_log();
    assert_eq!(log.damage_dealt_by("player_1"), 0.0);
}

#[test]
fn test_damage_dealt_by_ignores_other_sources() {
    let mut log = create_test_log();
    log.log_damage(100, Some("player_1"), "bot_0_5", 100.0, 50.0, false);
    log.log_damage(900, Some("player_1"), "bot_0_5", 80.0, 0.0, false);
    log.log_damage(950, Some("bot_0_5"), "player_1", 35.0, 0.0, false);
    log.log_damage(990, None, "player_1", 5.0, 0.0, false);

    assert_eq!(log.damage_dealt_by("player_1"), 180.0);
    assert_eq!(log.damage_dealt_by("bot_0_5"), 35.0);
}

#[test]
fn test_killing_blows_are_counted_per_source() {
    let mut log = create_test_log();
    log.log_damage(100, Some("player_1"), "bot_0_5", 100.0, 50.0, false);
    log.log_damage(1_100, Some("player_1"), "bot_0_5", 100.0, 0.0, true);
    log.log_damage(1_200, Some("bot_0_6"), "bot_0_1", 150.0, 0.0, true);

    assert_eq!(log.killing_blows_by("player_1"), 1);
    assert_eq!(log.killing_blows_by("bot_0_6"), 1);
    assert_eq!(log.killing_blows_by("bot_0_1"), 0);
}

// =============================================================================
// Freeze Tracking Tests
// =============================================================================

#[test]
fn test_freeze_duration_accumulates_per_target() {
    let mut log = create_test_log();
    log.log_freeze(0, Some("odysseus"), "bot_0_5", 5_000);
    log.log_freeze(30_000, Some("odysseus"), "bot_0_5", 5_000);
    log.log_freeze(30_000, Some("odysseus"), "bot_0_7", 5_000);

    assert_eq!(log.freeze_ms_on("bot_0_5"), 10_000);
    assert_eq!(log.freeze_ms_on("bot_0_7"), 5_000);
    assert_eq!(log.freeze_ms_on("odysseus"), 0);
}

// =============================================================================
// Filtering Tests
// =============================================================================

#[test]
fn test_hp_changes_only_keeps_damage_and_healing() {
    let mut log = create_test_log();
    log.log(0, CombatLogEventType::MatchEvent, "Battle begins".to_string());
    log.log_damage(10, Some("a"), "b", 10.0, 0.0, false);
    log.log_healing(20, "c", "b", 5.0);
    log.log_ability(20, "c", "heal");
    log.log_death(30, "b", Some("a"));

    let changes = log.hp_changes_only();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].event_type, CombatLogEventType::Damage);
    assert_eq!(changes[1].event_type, CombatLogEventType::Healing);
    assert_eq!(log.filter_by_type(CombatLogEventType::AbilityUsed).len(), 1);
}

#[test]
fn test_deaths_are_listed_with_killers() {
    let mut log = create_test_log();
    log.log_death(500, "hero", Some("bot_0_6"));
    log.log_death(500, "hero_clone_1", Some("bot_0_6"));

    assert_eq!(log.deaths(), vec!["hero", "hero_clone_1"]);
    match &log.entries[1].data {
        Some(StructuredEventData::Death { killer, .. }) => {
            assert_eq!(killer.as_deref(), Some("bot_0_6"))
        }
        other => panic!("expected death data, got {:?}", other),
    }
}

#[test]
fn test_clear_empties_the_log() {
    let mut log = create_test_log();
    log.log_death(500, "hero", None);
    log.clear();
    assert!(log.entries.is_empty());
    assert!(log.recent(5).is_empty());
}

// =============================================================================
// Serialization Tests
// =============================================================================

#[test]
fn test_structured_data_serializes_with_kind_tag() {
    let mut log = create_test_log();
    log.log_freeze(250, Some("odysseus"), "bot_0_5", 5_000);
    let json = serde_json::to_value(&log).unwrap();

    let entry = &json["entries"][0];
    assert_eq!(entry["timestamp_ms"], 250);
    assert_eq!(entry["data"]["kind"], "freeze");
    assert_eq!(entry["data"]["duration_ms"], 5_000);
}
