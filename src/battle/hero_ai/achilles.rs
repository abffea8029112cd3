//! Achilles summons his clone whenever he is engaging rather than retreating.

use super::{HeroAI, HeroContext};

pub struct AchillesAI;

impl HeroAI for AchillesAI {
    fn wants_ability(&self, ctx: &HeroContext) -> bool {
        ctx.target_info().is_some() && !ctx.retreating
    }
}
