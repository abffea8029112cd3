//! Hero-Specific Ability AI
//!
//! Each hero type has its own module implementing `HeroAI`, deciding whether
//! its ability is worth using right now. Cooldown, freeze and the random pass
//! are handled by the bot brain before these are consulted.
//!
//! The decision works on a `HeroContext`, a read-only view of the battlefield
//! from one combatant's point of view, so each hero can be tested in isolation.

pub mod achilles;
pub mod agamemnon;
pub mod menelaus;
pub mod odysseus;

use crate::battle::combat_core::Battlefield;
use crate::battle::components::Combatant;
use crate::config::BotTuning;
use crate::lobby::roles::HeroType;

/// Read-only view used for ability decisions
pub struct HeroContext<'a> {
    pub battlefield: &'a Battlefield,
    pub self_id: &'a str,
    /// The bot's current target, if it has one
    pub target_id: Option<&'a str>,
    pub retreating: bool,
    pub tuning: &'a BotTuning,
}

impl<'a> HeroContext<'a> {
    pub fn self_info(&self) -> Option<&'a Combatant> {
        self.battlefield.get(self.self_id)
    }

    /// The current target, provided it is still alive
    pub fn target_info(&self) -> Option<&'a Combatant> {
        self.target_id
            .and_then(|id| self.battlefield.get(id))
            .filter(|c| c.alive)
    }

    pub fn alive_enemies(&self) -> Vec<&'a Combatant> {
        let Some(me) = self.self_info() else {
            return Vec::new();
        };
        self.battlefield
            .alive()
            .filter(|c| c.team != me.team)
            .collect()
    }

    /// Living teammates, self included
    pub fn alive_allies(&self) -> Vec<&'a Combatant> {
        let Some(me) = self.self_info() else {
            return Vec::new();
        };
        self.battlefield.alive_on_team(me.team).collect()
    }

    /// Mean health fraction over living teammates, self included
    pub fn team_average_health(&self) -> f32 {
        let allies = self.alive_allies();
        if allies.is_empty() {
            return 1.0;
        }
        allies.iter().map(|c| c.health_fraction()).sum::<f32>() / allies.len() as f32
    }

    pub fn enemies_within(&self, radius: f32) -> usize {
        let Some(me) = self.self_info() else {
            return 0;
        };
        self.alive_enemies()
            .iter()
            .filter(|c| c.distance_to(me) < radius)
            .count()
    }
}

pub trait HeroAI {
    /// Whether the ability should be used this evaluation
    fn wants_ability(&self, ctx: &HeroContext) -> bool;
}

pub fn get_hero_ai(hero: HeroType) -> Box<dyn HeroAI> {
    match hero {
        HeroType::Achilles => Box::new(achilles::AchillesAI),
        HeroType::Agamemnon => Box::new(agamemnon::AgamemnonAI),
        HeroType::Menelaus => Box::new(menelaus::MenelausAI),
        HeroType::Odysseus => Box::new(odysseus::OdysseusAI),
    }
}
