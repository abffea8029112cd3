//! Hero abilities
//!
//! Each hero type has one ability on its own cooldown:
//!
//! - Achilles: summon a clone that fights alongside and dies with its master
//! - Agamemnon: heal every living teammate (clones excluded)
//! - Menelaus: rage, a temporary damage bonus
//! - Odysseus: aegis, freezing every living enemy
//!
//! Remote ability reports only replay heal and aegis; a clone or a rage
//! buff is already part of the caster's own simulation.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::SimReport;
use crate::config::StatBlock;
use crate::lobby::protocol::AbilityKind;

use super::combat_core::Battlefield;
use super::components::{Combatant, CombatRole, CombatantId, ControllerKind, Rage, Weapon};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityBlocked {
    UnknownCombatant,
    NoAbility,
    Dead,
    Frozen,
    Cooldown,
    /// Achilles already has a living clone
    CloneAlive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityOutcome {
    Used(AbilityKind),
    NotPerformed(AbilityBlocked),
}

impl AbilityOutcome {
    pub fn performed(&self) -> bool {
        matches!(self, AbilityOutcome::Used(_))
    }
}

impl Battlefield {
    /// Check whether `caster` could use its ability right now
    pub fn ability_blocker(&self, caster: &str) -> Option<AbilityBlocked> {
        let Some(c) = self.get(caster) else {
            return Some(AbilityBlocked::UnknownCombatant);
        };
        if c.ability().is_none() {
            return Some(AbilityBlocked::NoAbility);
        }
        if !c.alive {
            return Some(AbilityBlocked::Dead);
        }
        if c.frozen {
            return Some(AbilityBlocked::Frozen);
        }
        if !c.ability_ready(self.now_ms) {
            return Some(AbilityBlocked::Cooldown);
        }
        None
    }

    pub fn can_use_ability(&self, caster: &str) -> bool {
        self.ability_blocker(caster).is_none()
    }

    /// Use `caster`'s ability, stamping its cooldown on success
    pub fn use_ability(&mut self, caster: &str) -> AbilityOutcome {
        if let Some(blocked) = self.ability_blocker(caster) {
            return AbilityOutcome::NotPerformed(blocked);
        }
        let Some(kind) = self.get(caster).and_then(Combatant::ability) else {
            return AbilityOutcome::NotPerformed(AbilityBlocked::NoAbility);
        };

        let applied = match kind {
            AbilityKind::Clone => self.summon_clone(caster),
            AbilityKind::Heal => {
                self.heal_team(caster);
                Ok(())
            }
            AbilityKind::Rage => {
                self.activate_rage(caster);
                Ok(())
            }
            AbilityKind::Aegis => {
                self.cast_aegis(caster);
                Ok(())
            }
        };
        if let Err(blocked) = applied {
            return AbilityOutcome::NotPerformed(blocked);
        }

        let now = self.now_ms;
        let Some(c) = self.get_mut(caster) else {
            return AbilityOutcome::NotPerformed(AbilityBlocked::UnknownCombatant);
        };
        c.last_ability_ms = Some(now);
        let position = c.position;
        let report = c.locally_controlled;

        self.log.log_ability(now, caster, kind.name());
        if report {
            self.reports.push(SimReport::AbilityUsed {
                caster: caster.to_string(),
                kind,
                position,
            });
        }
        AbilityOutcome::Used(kind)
    }

    /// Replay another participant's ability. Only heal and aegis touch
    /// combatants this simulation does not own; others are ignored.
    pub fn apply_remote_ability(&mut self, caster: &str, kind: AbilityKind) -> bool {
        if !self.get(caster).is_some_and(|c| c.alive) {
            return false;
        }
        match kind {
            AbilityKind::Heal => {
                self.heal_team(caster);
                true
            }
            AbilityKind::Aegis => {
                self.cast_aegis(caster);
                true
            }
            AbilityKind::Clone | AbilityKind::Rage => false,
        }
    }

    /// Living clones owned by `master`
    pub fn living_clones_of(&self, master: &str) -> Vec<&Combatant> {
        self.get(master)
            .map(|m| {
                m.dependents
                    .iter()
                    .filter_map(|d| self.get(d))
                    .filter(|c| c.alive)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn summon_clone(&mut self, master_id: &str) -> Result<(), AbilityBlocked> {
        if !self.living_clones_of(master_id).is_empty() {
            return Err(AbilityBlocked::CloneAlive);
        }
        let Some(master) = self.get(master_id) else {
            return Err(AbilityBlocked::UnknownCombatant);
        };

        let tuning = self.config.abilities;
        let template = self.config.stats.achilles;
        let stats = StatBlock {
            health: master.max_health * tuning.clone_stat_fraction,
            shield: None,
            damage: master.base_damage * tuning.clone_stat_fraction,
            speed: template.speed,
            attack_range: template.attack_range,
            attack_speed: template.attack_speed,
            weapon: Weapon::Melee,
            ability_cooldown_ms: 0,
        };
        let name = format!("{}'s Clone", master.name);
        let team = master.team;
        let position = self
            .config
            .arena
            .clamp(master.position + Vec2::new(tuning.clone_spawn_offset, 0.0));

        self.clones_summoned += 1;
        let clone_id: CombatantId = format!("{}_clone_{}", master_id, self.clones_summoned);
        let clone = Combatant::new(
            clone_id.clone(),
            name,
            team,
            CombatRole::Clone,
            ControllerKind::Bot,
            position,
            &stats,
        );

        if !self.spawn(clone) {
            return Err(AbilityBlocked::CloneAlive);
        }
        if let Some(master) = self.get_mut(master_id) {
            let mut alive: SmallVec<[CombatantId; 1]> = SmallVec::new();
            alive.push(clone_id);
            master.dependents = alive;
        }
        Ok(())
    }

    fn heal_team(&mut self, caster_id: &str) {
        let Some(caster) = self.get(caster_id) else {
            return;
        };
        let amount = caster.max_health * self.config.abilities.heal_fraction;
        let team = caster.team;
        let allies: Vec<CombatantId> = self
            .alive_on_team(team)
            .filter(|c| !c.is_clone())
            .map(|c| c.id.clone())
            .collect();

        let mut total = 0.0;
        for ally in allies {
            let healed = self.heal(&ally, amount);
            if healed > 0.0 {
                self.log.log_healing(self.now_ms, caster_id, &ally, healed);
            }
            total += healed;
        }
        if let Some(caster) = self.get_mut(caster_id) {
            caster.healing_done += total;
        }
    }

    fn activate_rage(&mut self, caster_id: &str) {
        let tuning = self.config.abilities;
        let now = self.now_ms;
        if let Some(c) = self.get_mut(caster_id) {
            c.damage = c.base_damage * (1.0 + tuning.rage_damage_bonus);
            c.rage = Some(Rage {
                until_ms: now + tuning.rage_duration_ms,
            });
        }
    }

    fn cast_aegis(&mut self, caster_id: &str) {
        let Some(team) = self.get(caster_id).map(|c| c.team) else {
            return;
        };
        let duration = self.config.abilities.aegis_freeze_ms;
        let enemies: Vec<CombatantId> = self
            .alive()
            .filter(|c| c.team != team)
            .map(|c| c.id.clone())
            .collect();
        for enemy in enemies {
            self.freeze(&enemy, duration, Some(caster_id));
        }
    }
}
