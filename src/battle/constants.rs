//! Combat constants
//!
//! Default tuning values. Every value here can be overridden through
//! `assets/config/game.ron`; these are what a missing or partial file falls
//! back to.

// ============================================================================
// Arena
// ============================================================================

/// Playable area, inset from the 1280x720 world by the wall thickness
pub const ARENA_MIN: [f32; 2] = [40.0, 20.0];
pub const ARENA_MAX: [f32; 2] = [1240.0, 700.0];

pub const TEAM1_SPAWN: [f32; 2] = [150.0, 340.0];
pub const TEAM2_SPAWN: [f32; 2] = [1050.0, 340.0];

/// Horizontal spacing between teammates at spawn, centred on the third seat
pub const SPAWN_SPACING: f32 = 40.0;

/// Nominal frame step in milliseconds (~60Hz)
pub const NOMINAL_STEP_MS: u64 = 16;

// ============================================================================
// Projectiles
// ============================================================================

pub const ARROW_SPEED: f32 = 600.0;
pub const FIREBALL_SPEED: f32 = 500.0;
pub const PROJECTILE_MAX_TRAVEL: f32 = 1000.0;
/// A projectile hits the first enemy strictly closer than this
pub const PROJECTILE_HIT_RADIUS: f32 = 20.0;

// ============================================================================
// Abilities
// ============================================================================

/// Clone health and damage as a fraction of the master's maximums
pub const CLONE_STAT_FRACTION: f32 = 0.75;
/// Clones appear this far to the right of the master
pub const CLONE_SPAWN_OFFSET: f32 = 30.0;

/// Heal amount as a fraction of the caster's max health
pub const HEAL_FRACTION: f32 = 0.5;

/// Rage adds this fraction of base damage
pub const RAGE_DAMAGE_BONUS: f32 = 0.5;
pub const RAGE_DURATION_MS: u64 = 8_000;

pub const AEGIS_FREEZE_MS: u64 = 5_000;

// ============================================================================
// Bot AI
// ============================================================================

pub const BOT_DECISION_INTERVAL_MS: u64 = 200;
pub const BOT_TARGET_LOCK_MS: u64 = 2_000;
pub const BOT_WANDER_INTERVAL_MS: u64 = 3_000;
pub const BOT_WANDER_ARRIVAL: f32 = 30.0;
/// Wander points are rolled at least this far inside the arena edge
pub const BOT_WANDER_MARGIN: f32 = 100.0;
pub const BOT_RETREAT_HEALTH_FRACTION: f32 = 0.3;

pub const BOT_ABILITY_INTERVAL_MS: u64 = 1_000;
pub const BOT_ABILITY_CHANCE: f32 = 0.8;

/// Ranged bots keep their target inside this band
pub const RANGED_MIN_DISTANCE: f32 = 150.0;
pub const RANGED_MAX_DISTANCE: f32 = 400.0;
/// Melee bots close to this fraction of attack range
pub const MELEE_APPROACH_FRACTION: f32 = 0.9;
/// Melee bots back off below this fraction of attack range
pub const MELEE_BACKOFF_FRACTION: f32 = 0.45;
pub const STRAFE_SPEED_FACTOR: f32 = 0.7;

/// Agamemnon heals when the team average falls below this
pub const HEAL_TEAM_HEALTH_THRESHOLD: f32 = 0.6;
/// Odysseus casts aegis when this many enemies are inside the radius
pub const AEGIS_MIN_ENEMIES: usize = 2;
pub const AEGIS_TRIGGER_RADIUS: f32 = 300.0;

// ============================================================================
// Target scoring
// ============================================================================

pub const SCORE_DISTANCE_BASE: f32 = 1000.0;
pub const SCORE_DISTANCE_DIVISOR: f32 = 10.0;
pub const SCORE_MISSING_HEALTH_WEIGHT: f32 = 100.0;
pub const SCORE_SOLDIER_VS_NON_HERO: f32 = 50.0;
pub const SCORE_WIZARD_SWEET_SPOT: f32 = 80.0;
pub const SCORE_HERO_VS_HERO: f32 = 70.0;
/// Exclusive distance band earning the wizard bonus
pub const WIZARD_SWEET_SPOT: (f32, f32) = (200.0, 400.0);
