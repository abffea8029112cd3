//! Game configuration
//!
//! Stats, ability tuning, bot behaviour and controller timings, loaded from
//! `assets/config/game.ron`. Every section and field is optional in the file;
//! anything left out keeps its default.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::components::Weapon;
use crate::battle::constants::*;
use crate::lobby::roles::{HeroType, Role, RoleAssignment};
use crate::lobby::timers::MatchTimings;

pub const DEFAULT_CONFIG_PATH: &str = "assets/config/game.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid game config: {0}")]
    Invalid(String),
}

/// Base stats for one role or hero
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    pub health: f32,
    #[serde(default)]
    pub shield: Option<f32>,
    pub damage: f32,
    pub speed: f32,
    pub attack_range: f32,
    /// Attacks per second
    pub attack_speed: f32,
    pub weapon: Weapon,
    #[serde(default)]
    pub ability_cooldown_ms: u64,
}

impl StatBlock {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.health <= 0.0 || self.attack_speed <= 0.0 || self.speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{} needs positive health and attack speed",
                name
            )));
        }
        if self.shield.is_some_and(|s| s < 0.0) || self.damage < 0.0 || self.attack_range < 0.0 {
            return Err(ConfigError::Invalid(format!("{} has a negative stat", name)));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleStats {
    pub soldier: StatBlock,
    pub wizard: StatBlock,
    pub achilles: StatBlock,
    pub agamemnon: StatBlock,
    pub menelaus: StatBlock,
    pub odysseus: StatBlock,
}

impl RoleStats {
    pub fn hero(&self, hero: HeroType) -> &StatBlock {
        match hero {
            HeroType::Achilles => &self.achilles,
            HeroType::Agamemnon => &self.agamemnon,
            HeroType::Menelaus => &self.menelaus,
            HeroType::Odysseus => &self.odysseus,
        }
    }

    /// Stats for an assignment. A hero seat without a hero type has none.
    pub fn for_assignment(&self, assignment: &RoleAssignment) -> Option<&StatBlock> {
        match assignment.role {
            Role::Soldier => Some(&self.soldier),
            Role::Wizard => Some(&self.wizard),
            Role::Hero => assignment.hero_type.map(|h| self.hero(h)),
        }
    }
}

impl Default for RoleStats {
    fn default() -> Self {
        Self {
            soldier: StatBlock {
                health: 100.0,
                shield: Some(50.0),
                damage: 100.0,
                speed: 100.0,
                attack_range: 35.0,
                attack_speed: 1.0,
                weapon: Weapon::Melee,
                ability_cooldown_ms: 0,
            },
            wizard: StatBlock {
                health: 120.0,
                shield: None,
                damage: 80.0,
                speed: 90.0,
                attack_range: 400.0,
                attack_speed: 2.0,
                weapon: Weapon::Fireball,
                ability_cooldown_ms: 0,
            },
            achilles: StatBlock {
                health: 75.0,
                shield: None,
                damage: 150.0,
                speed: 120.0,
                attack_range: 45.0,
                attack_speed: 1.2,
                weapon: Weapon::Melee,
                ability_cooldown_ms: 45_000,
            },
            agamemnon: StatBlock {
                health: 100.0,
                shield: None,
                damage: 100.0,
                speed: 100.0,
                attack_range: 35.0,
                attack_speed: 1.0,
                weapon: Weapon::Melee,
                ability_cooldown_ms: 60_000,
            },
            menelaus: StatBlock {
                health: 100.0,
                shield: None,
                damage: 100.0,
                speed: 100.0,
                attack_range: 35.0,
                attack_speed: 1.0,
                weapon: Weapon::Melee,
                ability_cooldown_ms: 25_000,
            },
            odysseus: StatBlock {
                health: 100.0,
                shield: None,
                damage: 100.0,
                speed: 100.0,
                attack_range: 400.0,
                attack_speed: 1.5,
                weapon: Weapon::Bow,
                ability_cooldown_ms: 30_000,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub min: [f32; 2],
    pub max: [f32; 2],
    pub team1_spawn: [f32; 2],
    pub team2_spawn: [f32; 2],
    pub spawn_spacing: f32,
}

impl ArenaConfig {
    pub fn min(&self) -> Vec2 {
        Vec2::from(self.min)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::from(self.max)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min[0]
            && point.x <= self.max[0]
            && point.y >= self.min[1]
            && point.y <= self.max[1]
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    pub fn team_spawn(&self, team: u8) -> Vec2 {
        if team == 1 {
            Vec2::from(self.team1_spawn)
        } else {
            Vec2::from(self.team2_spawn)
        }
    }

    /// Spawn point of the `index`-th member of `team`
    pub fn seat_spawn(&self, team: u8, index: usize) -> Vec2 {
        let offset = (index as f32 - 2.0) * self.spawn_spacing;
        self.clamp(self.team_spawn(team) + Vec2::new(offset, 0.0))
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            min: ARENA_MIN,
            max: ARENA_MAX,
            team1_spawn: TEAM1_SPAWN,
            team2_spawn: TEAM2_SPAWN,
            spawn_spacing: SPAWN_SPACING,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    pub arrow_speed: f32,
    pub fireball_speed: f32,
    pub max_travel: f32,
    pub hit_radius: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            arrow_speed: ARROW_SPEED,
            fireball_speed: FIREBALL_SPEED,
            max_travel: PROJECTILE_MAX_TRAVEL,
            hit_radius: PROJECTILE_HIT_RADIUS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityTuning {
    pub clone_stat_fraction: f32,
    pub clone_spawn_offset: f32,
    pub heal_fraction: f32,
    pub rage_damage_bonus: f32,
    pub rage_duration_ms: u64,
    pub aegis_freeze_ms: u64,
}

impl Default for AbilityTuning {
    fn default() -> Self {
        Self {
            clone_stat_fraction: CLONE_STAT_FRACTION,
            clone_spawn_offset: CLONE_SPAWN_OFFSET,
            heal_fraction: HEAL_FRACTION,
            rage_damage_bonus: RAGE_DAMAGE_BONUS,
            rage_duration_ms: RAGE_DURATION_MS,
            aegis_freeze_ms: AEGIS_FREEZE_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    pub decision_interval_ms: u64,
    pub target_lock_ms: u64,
    pub wander_interval_ms: u64,
    pub wander_arrival: f32,
    pub wander_margin: f32,
    pub retreat_health_fraction: f32,
    pub ability_interval_ms: u64,
    pub ability_chance: f32,
    pub ranged_min_distance: f32,
    pub ranged_max_distance: f32,
    pub melee_approach_fraction: f32,
    pub melee_backoff_fraction: f32,
    pub strafe_speed_factor: f32,
    pub heal_team_health_threshold: f32,
    pub aegis_min_enemies: usize,
    pub aegis_trigger_radius: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            decision_interval_ms: BOT_DECISION_INTERVAL_MS,
            target_lock_ms: BOT_TARGET_LOCK_MS,
            wander_interval_ms: BOT_WANDER_INTERVAL_MS,
            wander_arrival: BOT_WANDER_ARRIVAL,
            wander_margin: BOT_WANDER_MARGIN,
            retreat_health_fraction: BOT_RETREAT_HEALTH_FRACTION,
            ability_interval_ms: BOT_ABILITY_INTERVAL_MS,
            ability_chance: BOT_ABILITY_CHANCE,
            ranged_min_distance: RANGED_MIN_DISTANCE,
            ranged_max_distance: RANGED_MAX_DISTANCE,
            melee_approach_fraction: MELEE_APPROACH_FRACTION,
            melee_backoff_fraction: MELEE_BACKOFF_FRACTION,
            strafe_speed_factor: STRAFE_SPEED_FACTOR,
            heal_team_health_threshold: HEAL_TEAM_HEALTH_THRESHOLD,
            aegis_min_enemies: AEGIS_MIN_ENEMIES,
            aegis_trigger_radius: AEGIS_TRIGGER_RADIUS,
        }
    }
}

/// Everything tunable about a match
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub arena: ArenaConfig,
    pub stats: RoleStats,
    pub abilities: AbilityTuning,
    pub projectiles: ProjectileTuning,
    pub bots: BotTuning,
    pub timings: MatchTimings,
}

impl GameConfig {
    pub fn from_ron(contents: &str, path: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = ron::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path_str.clone(),
            source,
        })?;
        let config = Self::from_ron(&contents, &path_str)?;
        info!("Loaded game config from {}", path_str);
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No game config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let stats = &self.stats;
        stats.soldier.validate("soldier")?;
        stats.wizard.validate("wizard")?;
        for hero in HeroType::ALL {
            stats.hero(hero).validate(hero.name())?;
        }

        let arena = &self.arena;
        if arena.min[0] >= arena.max[0] || arena.min[1] >= arena.max[1] {
            return Err(ConfigError::Invalid("arena min must be below max".into()));
        }
        if !arena.contains(arena.team_spawn(1)) || !arena.contains(arena.team_spawn(2)) {
            return Err(ConfigError::Invalid("team spawns must lie inside the arena".into()));
        }

        let t = &self.timings;
        if t.game_tick_ms == 0 {
            return Err(ConfigError::Invalid("game_tick_ms must be positive".into()));
        }
        if t.main_time_ms >= t.draw_time_ms {
            return Err(ConfigError::Invalid(
                "main_time_ms must end before draw_time_ms".into(),
            ));
        }
        if self.bots.decision_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "decision_interval_ms must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.bots.ability_chance) {
            return Err(ConfigError::Invalid("ability_chance must be in [0, 1]".into()));
        }
        Ok(())
    }
}
