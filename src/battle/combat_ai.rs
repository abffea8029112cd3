//! Bot decision engine
//!
//! One `BotBrain` per bot-controlled combatant, re-evaluated on a fixed
//! cadence of simulated time. Each evaluation:
//!
//! 1. Sets the retreat flag from current health
//! 2. Keeps the locked target, or scores every living enemy for a new one
//! 3. Moves (retreat, hold the weapon's preferred band, or wander)
//! 4. Attacks the target unless retreating
//! 5. Once per ability interval, rolls whether to use the hero ability

use bevy::prelude::*;

use crate::combat::GameRng;
use crate::config::BotTuning;

use super::abilities::AbilityOutcome;
use super::combat_core::{AttackOutcome, Battlefield};
use super::components::{CombatRole, Combatant, CombatantId};
use super::constants::*;
use super::hero_ai::{get_hero_ai, HeroContext};

/// Movement chosen by one evaluation
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Movement {
    Toward(Vec2),
    Away(Vec2),
    /// Sideways along the given direction, at reduced speed
    Strafe(Vec2),
}

/// What one evaluation did
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BotDecision {
    pub movement: Movement,
    /// Present when an attack was attempted
    pub attack: Option<AttackOutcome>,
    /// Present when the ability was attempted
    pub ability: Option<AbilityOutcome>,
}

#[derive(Clone, Debug)]
pub struct BotBrain {
    pub combatant_id: CombatantId,
    last_decision_ms: Option<u64>,
    target: Option<CombatantId>,
    target_acquired_ms: u64,
    wander_point: Option<Vec2>,
    wander_rolled_ms: u64,
    retreating: bool,
    last_ability_check_ms: Option<u64>,
}

impl BotBrain {
    pub fn new(combatant_id: impl Into<CombatantId>) -> Self {
        Self {
            combatant_id: combatant_id.into(),
            last_decision_ms: None,
            target: None,
            target_acquired_ms: 0,
            wander_point: None,
            wander_rolled_ms: 0,
            retreating: false,
            last_ability_check_ms: None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn is_retreating(&self) -> bool {
        self.retreating
    }

    pub fn wander_point(&self) -> Option<Vec2> {
        self.wander_point
    }

    /// Run one evaluation if the cadence allows. A dead or frozen bot is
    /// halted and skipped.
    pub fn update(&mut self, field: &mut Battlefield, rng: &mut GameRng) -> Option<BotDecision> {
        let now = field.now_ms();
        let tuning = field.config().bots;
        let id = self.combatant_id.clone();

        let me = field.get(&id)?;
        if !me.alive || me.frozen {
            field.stop(&id);
            return None;
        }
        if self
            .last_decision_ms
            .is_some_and(|last| now.saturating_sub(last) < tuning.decision_interval_ms)
        {
            return None;
        }
        self.last_decision_ms = Some(now);
        self.retreating = me.health_fraction() < tuning.retreat_health_fraction;

        self.update_target(field, now, &tuning);

        let (movement, attack) = match self.target.clone() {
            Some(target) => {
                let movement = self.engage(field, &target, rng, &tuning);
                apply_movement(field, &id, movement, &tuning);
                let attack = (!self.retreating).then(|| field.attack(&id, &target));
                (movement, attack)
            }
            None => {
                let movement = self.wander(field, rng, now, &tuning);
                apply_movement(field, &id, movement, &tuning);
                (movement, None)
            }
        };

        let ability = self.consider_ability(field, rng, now, &tuning);
        Some(BotDecision {
            movement,
            attack,
            ability,
        })
    }

    fn update_target(&mut self, field: &Battlefield, now: u64, tuning: &BotTuning) {
        let locked = self
            .target
            .as_deref()
            .and_then(|t| field.get(t))
            .is_some_and(|t| t.alive)
            && now.saturating_sub(self.target_acquired_ms) < tuning.target_lock_ms;
        if locked {
            return;
        }
        let next = field
            .get(&self.combatant_id)
            .and_then(|me| select_target(field, me));
        if next != self.target {
            self.target_acquired_ms = now;
        }
        self.target = next;
    }

    fn engage(
        &self,
        field: &Battlefield,
        target_id: &str,
        rng: &mut GameRng,
        tuning: &BotTuning,
    ) -> Movement {
        let (Some(me), Some(target)) = (field.get(&self.combatant_id), field.get(target_id)) else {
            return Movement::Toward(Vec2::ZERO);
        };

        if self.retreating {
            let refuge = field
                .alive_on_team(me.team)
                .filter(|c| c.id != me.id)
                .min_by(|a, b| a.distance_to(me).total_cmp(&b.distance_to(me)))
                .map(|c| c.position)
                .unwrap_or_else(|| field.config().arena.team_spawn(me.team));
            return Movement::Toward(refuge);
        }

        let distance = me.distance_to(target);
        let (near, far) = if me.weapon.is_ranged() {
            (tuning.ranged_min_distance, tuning.ranged_max_distance)
        } else {
            (
                me.attack_range * tuning.melee_backoff_fraction,
                me.attack_range * tuning.melee_approach_fraction,
            )
        };

        if distance > far {
            Movement::Toward(target.position)
        } else if distance < near {
            Movement::Away(target.position)
        } else {
            let line = target.position - me.position;
            let perpendicular = Vec2::new(-line.y, line.x);
            if rng.chance(0.5) {
                Movement::Strafe(perpendicular)
            } else {
                Movement::Strafe(-perpendicular)
            }
        }
    }

    fn wander(
        &mut self,
        field: &Battlefield,
        rng: &mut GameRng,
        now: u64,
        tuning: &BotTuning,
    ) -> Movement {
        let position = field
            .get(&self.combatant_id)
            .map(|c| c.position)
            .unwrap_or_default();
        let stale = match self.wander_point {
            None => true,
            Some(point) => {
                now.saturating_sub(self.wander_rolled_ms) >= tuning.wander_interval_ms
                    || position.distance(point) < tuning.wander_arrival
            }
        };
        if stale {
            let arena = field.config().arena;
            let margin = tuning.wander_margin;
            let point = Vec2::new(
                rng.random_range(arena.min[0] + margin, arena.max[0] - margin),
                rng.random_range(arena.min[1] + margin, arena.max[1] - margin),
            );
            self.wander_point = Some(point);
            self.wander_rolled_ms = now;
        }
        Movement::Toward(self.wander_point.unwrap_or(position))
    }

    fn consider_ability(
        &mut self,
        field: &mut Battlefield,
        rng: &mut GameRng,
        now: u64,
        tuning: &BotTuning,
    ) -> Option<AbilityOutcome> {
        let hero = field.get(&self.combatant_id)?.hero_type()?;
        if self
            .last_ability_check_ms
            .is_some_and(|last| now.saturating_sub(last) < tuning.ability_interval_ms)
        {
            return None;
        }
        self.last_ability_check_ms = Some(now);

        if !field.can_use_ability(&self.combatant_id) || !rng.chance(tuning.ability_chance) {
            return None;
        }
        let wants = {
            let ctx = HeroContext {
                battlefield: field,
                self_id: &self.combatant_id,
                target_id: self.target.as_deref(),
                retreating: self.retreating,
                tuning,
            };
            get_hero_ai(hero).wants_ability(&ctx)
        };
        wants.then(|| field.use_ability(&self.combatant_id))
    }
}

fn apply_movement(field: &mut Battlefield, id: &str, movement: Movement, tuning: &BotTuning) {
    match movement {
        Movement::Toward(point) => field.move_toward(id, point),
        Movement::Away(point) => field.move_away(id, point),
        Movement::Strafe(direction) => field.steer(id, direction, tuning.strafe_speed_factor),
    }
}

/// Desirability of `candidate` as a target for `me`
pub fn score_target(me: &Combatant, candidate: &Combatant) -> f32 {
    let distance = me.distance_to(candidate);
    let mut score = (SCORE_DISTANCE_BASE - distance) / SCORE_DISTANCE_DIVISOR
        + (1.0 - candidate.health_fraction()) * SCORE_MISSING_HEALTH_WEIGHT;

    match me.role {
        CombatRole::Soldier if !candidate.is_hero() => score += SCORE_SOLDIER_VS_NON_HERO,
        CombatRole::Wizard
            if distance > WIZARD_SWEET_SPOT.0 && distance < WIZARD_SWEET_SPOT.1 =>
        {
            score += SCORE_WIZARD_SWEET_SPOT
        }
        CombatRole::Hero(_) if candidate.is_hero() => score += SCORE_HERO_VS_HERO,
        _ => {}
    }
    score
}

/// Best-scoring living enemy. Ties keep the first one seen.
pub fn select_target(field: &Battlefield, me: &Combatant) -> Option<CombatantId> {
    let mut best: Option<(&Combatant, f32)> = None;
    for candidate in field.alive().filter(|c| c.is_enemy_of(me)) {
        let score = score_target(me, candidate);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((candidate, score));
        }
    }
    best.map(|(c, _)| c.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hero_ai::test_support::{field, hero, soldier};
    use crate::lobby::roles::HeroType;

    #[test]
    fn equal_scores_keep_first_seen() {
        let field = field(vec![
            soldier("me", 1, 500.0),
            soldier("left", 2, 400.0),
            soldier("right", 2, 600.0),
        ]);
        let me = field.get("me").unwrap();
        assert_eq!(select_target(&field, me).as_deref(), Some("left"));
    }

    #[test]
    fn heroes_prefer_heroes() {
        let field = field(vec![
            hero("me", 1, HeroType::Menelaus, 500.0),
            soldier("close", 2, 550.0),
            hero("rival", 2, HeroType::Achilles, 600.0),
        ]);
        let me = field.get("me").unwrap();
        // 95 vs 90 + 70
        assert_eq!(select_target(&field, me).as_deref(), Some("rival"));
    }

    #[test]
    fn evaluations_follow_the_cadence() {
        let mut field = field(vec![soldier("me", 1, 500.0), soldier("foe", 2, 900.0)]);
        let mut rng = GameRng::from_seed(1);
        let mut brain = BotBrain::new("me");
        assert!(brain.update(&mut field, &mut rng).is_some());
        field.step(100);
        assert!(brain.update(&mut field, &mut rng).is_none());
        field.step(100);
        assert!(brain.update(&mut field, &mut rng).is_some());
    }

    #[test]
    fn frozen_bots_halt() {
        let mut field = field(vec![soldier("me", 1, 500.0), soldier("foe", 2, 900.0)]);
        let mut rng = GameRng::from_seed(1);
        let mut brain = BotBrain::new("me");
        brain.update(&mut field, &mut rng);
        assert_ne!(field.get("me").unwrap().velocity, Vec2::ZERO);

        field.freeze("me", 5_000, None);
        field.get_mut("me").unwrap().velocity = Vec2::new(10.0, 0.0);
        field.step(200);
        assert!(brain.update(&mut field, &mut rng).is_none());
        assert_eq!(field.get("me").unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn no_enemies_means_wandering_inside_the_margin() {
        let mut field = field(vec![soldier("me", 1, 500.0)]);
        let mut rng = GameRng::from_seed(4);
        let mut brain = BotBrain::new("me");
        let decision = brain.update(&mut field, &mut rng).unwrap();
        let Movement::Toward(point) = decision.movement else {
            panic!("expected wander movement, got {:?}", decision.movement);
        };
        assert!(point.x >= 140.0 && point.x <= 1140.0);
        assert!(point.y >= 120.0 && point.y <= 600.0);
        assert!(decision.attack.is_none());
    }
}
