//! Agamemnon heals once the team's average health drops below the threshold.

use super::{HeroAI, HeroContext};

pub struct AgamemnonAI;

impl HeroAI for AgamemnonAI {
    fn wants_ability(&self, ctx: &HeroContext) -> bool {
        ctx.team_average_health() < ctx.tuning.heal_team_health_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hero_ai::test_support::*;
    use crate::config::BotTuning;
    use crate::lobby::roles::HeroType;

    #[test]
    fn heals_when_team_average_is_low() {
        let mut field = field(vec![
            hero("g", 1, HeroType::Agamemnon, 100.0),
            soldier("s", 1, 140.0),
        ]);
        let tuning = BotTuning::default();
        assert!(!AgamemnonAI.wants_ability(&context(&field, "g", None, &tuning)));

        // 50 shield + 90 health: soldier at 10%, team average 55%
        field.take_damage("s", 140.0, None);
        assert!(AgamemnonAI.wants_ability(&context(&field, "g", None, &tuning)));
    }
}
