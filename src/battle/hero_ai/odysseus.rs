//! Odysseus casts aegis when enough enemies are close. The freeze itself
//! reaches every enemy regardless of distance.

use super::{HeroAI, HeroContext};

pub struct OdysseusAI;

impl HeroAI for OdysseusAI {
    fn wants_ability(&self, ctx: &HeroContext) -> bool {
        ctx.enemies_within(ctx.tuning.aegis_trigger_radius) >= ctx.tuning.aegis_min_enemies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hero_ai::test_support::*;
    use crate::config::BotTuning;
    use crate::lobby::roles::HeroType;

    #[test]
    fn needs_two_enemies_in_radius() {
        let mut field = field(vec![
            hero("o", 1, HeroType::Odysseus, 100.0),
            soldier("near", 2, 350.0),
            soldier("far", 2, 900.0),
        ]);
        let tuning = BotTuning::default();
        assert!(!OdysseusAI.wants_ability(&context(&field, "o", None, &tuning)));

        field.get_mut("far").unwrap().position.x = 390.0;
        assert!(OdysseusAI.wants_ability(&context(&field, "o", None, &tuning)));
    }

    #[test]
    fn enemies_on_the_radius_do_not_count() {
        let field = field(vec![
            hero("o", 1, HeroType::Odysseus, 100.0),
            soldier("edge_a", 2, 400.0),
            soldier("edge_b", 2, 400.0),
        ]);
        let tuning = BotTuning::default();
        let ctx = context(&field, "o", None, &tuning);
        assert_eq!(ctx.enemies_within(300.0), 0);
        assert!(!OdysseusAI.wants_ability(&ctx));
        assert_eq!(ctx.enemies_within(300.5), 2);
    }
}
