//! Projectiles
//!
//! Straight-line shots aimed at where the target stood when fired. They hit
//! the first living enemy they pass within the hit radius, and expire after
//! their maximum travel distance or on leaving the arena.

use bevy::prelude::*;

use crate::config::{ArenaConfig, ProjectileTuning};

use super::components::{CombatantId, ProjectileKind};

#[derive(Clone, Debug)]
pub struct Projectile {
    pub id: u64,
    pub owner_id: CombatantId,
    pub owner_team: u8,
    pub kind: ProjectileKind,
    pub position: Vec2,
    /// Unit vector
    pub direction: Vec2,
    pub speed: f32,
    /// Damage locked in when fired
    pub damage: f32,
    pub traveled: f32,
    pub active: bool,
}

impl Projectile {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        owner_id: CombatantId,
        owner_team: u8,
        kind: ProjectileKind,
        from: Vec2,
        toward: Vec2,
        damage: f32,
        tuning: &ProjectileTuning,
    ) -> Self {
        let speed = match kind {
            ProjectileKind::Arrow => tuning.arrow_speed,
            ProjectileKind::Fireball => tuning.fireball_speed,
        };
        let direction = (toward - from).try_normalize().unwrap_or(Vec2::X);
        Self {
            id,
            owner_id,
            owner_team,
            kind,
            position: from,
            direction,
            speed,
            damage,
            traveled: 0.0,
            active: true,
        }
    }

    pub fn advance(&mut self, dt_secs: f32) {
        let step = self.speed * dt_secs;
        self.position += self.direction * step;
        self.traveled += step;
    }

    /// Past its range or outside the arena
    pub fn expired(&self, arena: &ArenaConfig, tuning: &ProjectileTuning) -> bool {
        self.traveled > tuning.max_travel || !arena.contains(self.position)
    }
}
