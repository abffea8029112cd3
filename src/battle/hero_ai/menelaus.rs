//! Menelaus rages against heroes, or against anything with more health.

use super::{HeroAI, HeroContext};

pub struct MenelausAI;

impl HeroAI for MenelausAI {
    fn wants_ability(&self, ctx: &HeroContext) -> bool {
        let (Some(me), Some(target)) = (ctx.self_info(), ctx.target_info()) else {
            return false;
        };
        target.is_hero() || target.health > me.health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::hero_ai::test_support::*;
    use crate::config::BotTuning;
    use crate::lobby::roles::HeroType;

    #[test]
    fn rages_against_heroes_and_tougher_targets() {
        let mut field = field(vec![
            hero("m", 1, HeroType::Menelaus, 100.0),
            hero("h", 2, HeroType::Achilles, 300.0),
            soldier("s", 2, 320.0),
        ]);
        let tuning = BotTuning::default();
        assert!(MenelausAI.wants_ability(&context(&field, "m", Some("h"), &tuning)));
        // Equal health soldier is not worth it
        assert!(!MenelausAI.wants_ability(&context(&field, "m", Some("s"), &tuning)));

        field.take_damage("m", 10.0, None);
        assert!(MenelausAI.wants_ability(&context(&field, "m", Some("s"), &tuning)));
    }
}
