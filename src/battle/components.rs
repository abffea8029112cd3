//! Combatant record
//!
//! One flat record per combatant. The role tag plus the stat table decide how
//! it fights; there is no per-role type.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::StatBlock;
use crate::lobby::protocol::AbilityKind;
use crate::lobby::roles::{HeroType, Role, RoleAssignment};

pub type CombatantId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    Melee,
    Bow,
    Fireball,
}

impl Weapon {
    pub fn is_ranged(&self) -> bool {
        !matches!(self, Weapon::Melee)
    }

    pub fn projectile(&self) -> Option<ProjectileKind> {
        match self {
            Weapon::Melee => None,
            Weapon::Bow => Some(ProjectileKind::Arrow),
            Weapon::Fireball => Some(ProjectileKind::Fireball),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Arrow,
    Fireball,
}

/// Who decides what a combatant does
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Human,
    Bot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "hero")]
pub enum CombatRole {
    Soldier,
    Wizard,
    Hero(HeroType),
    Clone,
}

impl CombatRole {
    pub fn from_assignment(assignment: &RoleAssignment) -> Option<Self> {
        match assignment.role {
            Role::Soldier => Some(CombatRole::Soldier),
            Role::Wizard => Some(CombatRole::Wizard),
            Role::Hero => assignment.hero_type.map(CombatRole::Hero),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CombatRole::Soldier => "Soldier",
            CombatRole::Wizard => "Wizard",
            CombatRole::Hero(hero) => hero.name(),
            CombatRole::Clone => "Clone",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shield {
    pub current: f32,
    pub max: f32,
}

/// Active rage buff
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rage {
    pub until_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    /// 1 or 2
    pub team: u8,
    pub role: CombatRole,
    pub controller: ControllerKind,
    /// Deaths and ability uses of this combatant are reported by this simulation
    pub locally_controlled: bool,
    pub alive: bool,
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub shield: Option<Shield>,
    /// Current damage, including any rage bonus
    pub damage: f32,
    pub base_damage: f32,
    pub speed: f32,
    pub attack_range: f32,
    /// Attacks per second
    pub attack_speed: f32,
    pub weapon: Weapon,
    pub frozen: bool,
    pub frozen_until_ms: u64,
    pub last_attack_ms: Option<u64>,
    pub last_ability_ms: Option<u64>,
    pub ability_cooldown_ms: u64,
    pub rage: Option<Rage>,
    /// Combatants that die when this one dies
    pub dependents: SmallVec<[CombatantId; 1]>,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub healing_done: f32,
}

impl Combatant {
    pub fn new(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        team: u8,
        role: CombatRole,
        controller: ControllerKind,
        position: Vec2,
        stats: &StatBlock,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            team,
            role,
            controller,
            locally_controlled: false,
            alive: true,
            position,
            velocity: Vec2::ZERO,
            health: stats.health,
            max_health: stats.health,
            shield: stats.shield.map(|s| Shield { current: s, max: s }),
            damage: stats.damage,
            base_damage: stats.damage,
            speed: stats.speed,
            attack_range: stats.attack_range,
            attack_speed: stats.attack_speed,
            weapon: stats.weapon,
            frozen: false,
            frozen_until_ms: 0,
            last_attack_ms: None,
            last_ability_ms: None,
            ability_cooldown_ms: stats.ability_cooldown_ms,
            rage: None,
            dependents: SmallVec::new(),
            damage_dealt: 0.0,
            damage_taken: 0.0,
            healing_done: 0.0,
        }
    }

    pub fn with_local_control(mut self, local: bool) -> Self {
        self.locally_controlled = local;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    pub fn hero_type(&self) -> Option<HeroType> {
        match self.role {
            CombatRole::Hero(hero) => Some(hero),
            _ => None,
        }
    }

    pub fn is_hero(&self) -> bool {
        self.hero_type().is_some()
    }

    pub fn is_clone(&self) -> bool {
        self.role == CombatRole::Clone
    }

    pub fn is_bot(&self) -> bool {
        self.controller == ControllerKind::Bot
    }

    pub fn ability(&self) -> Option<AbilityKind> {
        self.hero_type().map(AbilityKind::of_hero)
    }

    /// Milliseconds between attacks
    pub fn attack_interval_ms(&self) -> u64 {
        (1000.0 / self.attack_speed).round() as u64
    }

    pub fn attack_ready(&self, now_ms: u64) -> bool {
        match self.last_attack_ms {
            Some(last) => now_ms.saturating_sub(last) >= self.attack_interval_ms(),
            None => true,
        }
    }

    pub fn ability_ready(&self, now_ms: u64) -> bool {
        self.ability_cooldown_remaining_ms(now_ms) == 0
    }

    pub fn ability_cooldown_remaining_ms(&self, now_ms: u64) -> u64 {
        match self.last_ability_ms {
            Some(last) => self
                .ability_cooldown_ms
                .saturating_sub(now_ms.saturating_sub(last)),
            None => 0,
        }
    }

    pub fn distance_to(&self, other: &Combatant) -> f32 {
        self.position.distance(other.position)
    }

    pub fn is_enemy_of(&self, other: &Combatant) -> bool {
        self.team != other.team
    }
}
