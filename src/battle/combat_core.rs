//! Combat resolver
//!
//! `Battlefield` owns one participant's copy of the fight: every combatant,
//! every projectile in flight, and the simulation clock. All mutation goes
//! through its operations so the health, shield and death rules hold:
//!
//! - health stays within `[0, max_health]`
//! - a shield absorbs damage before health
//! - once dead a combatant never moves, attacks, heals or takes damage again
//! - death cascades to dependents (a hero's clone) with the same killer

use std::collections::HashMap;

use bevy::prelude::*;

use crate::combat::{CombatLog, CombatLogEventType, SimReport};
use crate::config::GameConfig;

use super::components::{Combatant, CombatantId};
use super::projectiles::Projectile;

/// Why an attack did nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttackBlocked {
    UnknownCombatant,
    AttackerDead,
    TargetDead,
    Frozen,
    Cooldown,
    /// Melee weapon and the target is beyond reach
    OutOfRange,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttackOutcome {
    /// Melee hit landed immediately
    Melee { damage: f32 },
    /// A projectile was fired toward the target
    Projectile { projectile_id: u64 },
    NotPerformed(AttackBlocked),
}

impl AttackOutcome {
    pub fn performed(&self) -> bool {
        !matches!(self, AttackOutcome::NotPerformed(_))
    }
}

/// Damage split between shield and health
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DamageResult {
    pub absorbed: f32,
    pub health_lost: f32,
}

impl DamageResult {
    pub fn total(&self) -> f32 {
        self.absorbed + self.health_lost
    }
}

/// Apply `amount` to the shield first, then to health (clamped at zero)
pub fn apply_damage_with_shield(target: &mut Combatant, amount: f32) -> DamageResult {
    let mut remaining = amount.max(0.0);
    let mut absorbed = 0.0;
    if let Some(shield) = target.shield.as_mut() {
        if shield.current > 0.0 {
            absorbed = remaining.min(shield.current);
            shield.current -= absorbed;
            remaining -= absorbed;
        }
    }
    let health_lost = remaining.min(target.health);
    target.health = (target.health - remaining).max(0.0);
    DamageResult {
        absorbed,
        health_lost,
    }
}

#[derive(Resource)]
pub struct Battlefield {
    pub(super) now_ms: u64,
    pub(super) combatants: Vec<Combatant>,
    pub(super) index: HashMap<CombatantId, usize>,
    pub(super) projectiles: Vec<Projectile>,
    pub(super) next_projectile_id: u64,
    pub(super) clones_summoned: u32,
    pub(super) config: GameConfig,
    pub(super) reports: Vec<SimReport>,
    pub log: CombatLog,
}

impl Battlefield {
    pub fn new(config: GameConfig) -> Self {
        Self {
            now_ms: 0,
            combatants: Vec::new(),
            index: HashMap::new(),
            projectiles: Vec::new(),
            next_projectile_id: 0,
            clones_summoned: 0,
            config,
            reports: Vec::new(),
            log: CombatLog::default(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Add a combatant. Ids are unique; a duplicate is refused.
    pub fn spawn(&mut self, combatant: Combatant) -> bool {
        if self.index.contains_key(&combatant.id) {
            warn!("Refusing duplicate combatant {}", combatant.id);
            return false;
        }
        self.log.log(
            self.now_ms,
            CombatLogEventType::MatchEvent,
            format!(
                "{} ({}) joins team {}",
                combatant.name,
                combatant.role.name(),
                combatant.team
            ),
        );
        self.index
            .insert(combatant.id.clone(), self.combatants.len());
        self.combatants.push(combatant);
        true
    }

    pub(super) fn idx(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Combatant> {
        self.idx(id).map(|i| &self.combatants[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.idx(id).map(move |i| &mut self.combatants[i])
    }

    /// Every combatant ever spawned, dead ones included, in spawn order
    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn alive(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter().filter(|c| c.alive)
    }

    pub fn alive_on_team(&self, team: u8) -> impl Iterator<Item = &Combatant> {
        self.alive().filter(move |c| c.team == team)
    }

    pub fn team_alive_count(&self, team: u8) -> usize {
        self.alive_on_team(team).count()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Take the reports produced since the last drain
    pub fn drain_reports(&mut self) -> Vec<SimReport> {
        std::mem::take(&mut self.reports)
    }

    fn mobile_index(&self, id: &str) -> Option<usize> {
        self.idx(id)
            .filter(|&i| self.combatants[i].alive && !self.combatants[i].frozen)
    }

    /// Head toward `point` at full speed
    pub fn move_toward(&mut self, id: &str, point: Vec2) {
        if let Some(i) = self.mobile_index(id) {
            let c = &mut self.combatants[i];
            c.velocity = (point - c.position).normalize_or_zero() * c.speed;
        }
    }

    /// Head directly away from `point` at full speed
    pub fn move_away(&mut self, id: &str, point: Vec2) {
        if let Some(i) = self.mobile_index(id) {
            let c = &mut self.combatants[i];
            c.velocity = (c.position - point).normalize_or_zero() * c.speed;
        }
    }

    /// Move along `direction` at a fraction of full speed
    pub fn steer(&mut self, id: &str, direction: Vec2, speed_factor: f32) {
        if let Some(i) = self.mobile_index(id) {
            let c = &mut self.combatants[i];
            c.velocity = direction.normalize_or_zero() * c.speed * speed_factor;
        }
    }

    pub fn stop(&mut self, id: &str) {
        if let Some(c) = self.get_mut(id) {
            c.velocity = Vec2::ZERO;
        }
    }

    /// Attack `target_id`. Melee hits land at once; ranged weapons always
    /// fire a projectile when the target is out of reach.
    pub fn attack(&mut self, attacker_id: &str, target_id: &str) -> AttackOutcome {
        let (Some(a), Some(t)) = (self.idx(attacker_id), self.idx(target_id)) else {
            return AttackOutcome::NotPerformed(AttackBlocked::UnknownCombatant);
        };
        let now = self.now_ms;
        let attacker = &self.combatants[a];
        let target = &self.combatants[t];
        if !attacker.alive {
            return AttackOutcome::NotPerformed(AttackBlocked::AttackerDead);
        }
        if !target.alive {
            return AttackOutcome::NotPerformed(AttackBlocked::TargetDead);
        }
        if attacker.frozen {
            return AttackOutcome::NotPerformed(AttackBlocked::Frozen);
        }
        if !attacker.attack_ready(now) {
            return AttackOutcome::NotPerformed(AttackBlocked::Cooldown);
        }

        let damage = attacker.damage;
        if attacker.distance_to(target) <= attacker.attack_range {
            self.combatants[a].last_attack_ms = Some(now);
            let dealt = self.take_damage(target_id, damage, Some(attacker_id));
            return AttackOutcome::Melee { damage: dealt };
        }

        let Some(kind) = attacker.weapon.projectile() else {
            return AttackOutcome::NotPerformed(AttackBlocked::OutOfRange);
        };
        let projectile = Projectile::new(
            self.next_projectile_id,
            attacker.id.clone(),
            attacker.team,
            kind,
            attacker.position,
            target.position,
            damage,
            &self.config.projectiles,
        );
        let projectile_id = projectile.id;
        self.next_projectile_id += 1;
        self.projectiles.push(projectile);
        self.combatants[a].last_attack_ms = Some(now);
        AttackOutcome::Projectile { projectile_id }
    }

    /// Apply damage from `source`. Returns the total absorbed by shield and
    /// health; zero if the target was already dead.
    pub fn take_damage(&mut self, id: &str, amount: f32, source: Option<&str>) -> f32 {
        let Some(i) = self.idx(id) else {
            return 0.0;
        };
        let target = &mut self.combatants[i];
        if !target.alive {
            return 0.0;
        }
        let result = apply_damage_with_shield(target, amount);
        target.damage_taken += result.total();
        let lethal = target.health <= 0.0;

        self.log.log_damage(
            self.now_ms,
            source,
            id,
            result.total(),
            result.absorbed,
            lethal,
        );
        if let Some(attacker) = source.and_then(|s| self.get_mut(s)) {
            attacker.damage_dealt += result.total();
        }
        if lethal {
            self.die(id, source);
        }
        result.total()
    }

    /// Restore health up to the maximum. Returns the amount actually healed.
    pub fn heal(&mut self, id: &str, amount: f32) -> f32 {
        let Some(c) = self.get_mut(id) else {
            return 0.0;
        };
        if !c.alive {
            return 0.0;
        }
        let before = c.health;
        c.health = (c.health + amount.max(0.0)).min(c.max_health);
        c.health - before
    }

    /// Freeze for `duration_ms` from now. Re-freezing resets the expiry.
    pub fn freeze(&mut self, id: &str, duration_ms: u64, source: Option<&str>) {
        let now = self.now_ms;
        let Some(c) = self.get_mut(id) else {
            return;
        };
        if !c.alive {
            return;
        }
        c.frozen = true;
        c.frozen_until_ms = now + duration_ms;
        c.velocity = Vec2::ZERO;
        self.log.log_freeze(now, source, id, duration_ms);
    }

    /// Kill a combatant and, with the same killer, everything depending on it.
    /// Calling this on a dead combatant does nothing.
    pub fn die(&mut self, id: &str, killer: Option<&str>) {
        let Some(i) = self.idx(id) else {
            return;
        };
        let c = &mut self.combatants[i];
        if !c.alive {
            return;
        }
        c.alive = false;
        c.health = 0.0;
        c.velocity = Vec2::ZERO;
        c.frozen = false;
        if c.rage.take().is_some() {
            c.damage = c.base_damage;
        }
        let dependents = std::mem::take(&mut c.dependents);
        let report = c.locally_controlled;

        self.log.log_death(self.now_ms, id, killer);
        if report {
            self.reports.push(SimReport::Death {
                victim: id.to_string(),
                killer: killer.map(str::to_string),
            });
        }
        for dependent in dependents {
            self.die(&dependent, killer);
        }
    }

    /// Advance the clock by `delta_ms`: expire freezes and rage, move
    /// combatants within the arena, then fly projectiles.
    pub fn step(&mut self, delta_ms: u64) {
        self.now_ms += delta_ms;
        let now = self.now_ms;
        let dt = delta_ms as f32 / 1000.0;
        let arena = self.config.arena;

        for c in self.combatants.iter_mut().filter(|c| c.alive) {
            if c.frozen && now >= c.frozen_until_ms {
                c.frozen = false;
            }
            if c.rage.is_some_and(|r| now >= r.until_ms) {
                c.rage = None;
                c.damage = c.base_damage;
            }
            if !c.frozen {
                c.position = arena.clamp(c.position + c.velocity * dt);
            }
        }

        self.update_projectiles(dt);
    }

    fn update_projectiles(&mut self, dt: f32) {
        let mut projectiles = std::mem::take(&mut self.projectiles);
        let arena = self.config.arena;
        let tuning = self.config.projectiles;

        for projectile in projectiles.iter_mut() {
            projectile.advance(dt);
            if projectile.expired(&arena, &tuning) {
                projectile.active = false;
                continue;
            }
            let hit = self
                .combatants
                .iter()
                .find(|c| {
                    c.alive
                        && c.team != projectile.owner_team
                        && c.position.distance(projectile.position) < tuning.hit_radius
                })
                .map(|c| c.id.clone());
            if let Some(target) = hit {
                self.take_damage(&target, projectile.damage, Some(&projectile.owner_id));
                projectile.active = false;
            }
        }

        projectiles.retain(|p| p.active);
        // Nothing fires during resolution, but keep anything that did
        projectiles.append(&mut self.projectiles);
        self.projectiles = projectiles;
    }
}
