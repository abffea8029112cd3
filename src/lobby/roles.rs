//! Roles, hero types, and the per-team role pool.

use serde::{Deserialize, Serialize};

use crate::combat::GameRng;

/// Broad role a seat plays in battle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Hero,
    Wizard,
    Soldier,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Hero => "Hero",
            Role::Wizard => "Wizard",
            Role::Soldier => "Soldier",
        }
    }
}

/// The four heroes, each with a distinct signature ability
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeroType {
    Achilles,
    Agamemnon,
    Menelaus,
    Odysseus,
}

impl HeroType {
    pub const ALL: [HeroType; 4] = [
        HeroType::Achilles,
        HeroType::Agamemnon,
        HeroType::Menelaus,
        HeroType::Odysseus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HeroType::Achilles => "Achilles",
            HeroType::Agamemnon => "Agamemnon",
            HeroType::Menelaus => "Menelaus",
            HeroType::Odysseus => "Odysseus",
        }
    }
}

/// A seat's role, with the hero type present exactly when the role is hero
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_type: Option<HeroType>,
}

impl RoleAssignment {
    pub fn hero(hero_type: HeroType) -> Self {
        Self {
            role: Role::Hero,
            hero_type: Some(hero_type),
        }
    }

    pub fn wizard() -> Self {
        Self {
            role: Role::Wizard,
            hero_type: None,
        }
    }

    pub fn soldier() -> Self {
        Self {
            role: Role::Soldier,
            hero_type: None,
        }
    }

    /// Build an assignment for `role`, rolling a hero type when one is needed
    pub fn for_role(role: Role, rng: &mut GameRng) -> Self {
        match role {
            Role::Hero => Self::hero(random_hero_type(rng)),
            Role::Wizard => Self::wizard(),
            Role::Soldier => Self::soldier(),
        }
    }

    pub fn is_well_formed(&self) -> bool {
        (self.role == Role::Hero) == self.hero_type.is_some()
    }
}

/// Every team draws from the same five slots
pub const ROLE_POOL: [Role; 5] = [
    Role::Hero,
    Role::Wizard,
    Role::Soldier,
    Role::Soldier,
    Role::Soldier,
];

/// Pool slots not yet consumed by `assigned`, in pool order.
///
/// Each assignment consumes one matching slot, so a team holding one soldier
/// still has two soldier slots left.
pub fn available_roles<'a, I>(assigned: I) -> Vec<Role>
where
    I: IntoIterator<Item = &'a RoleAssignment>,
{
    let mut remaining: Vec<Role> = ROLE_POOL.to_vec();
    for assignment in assigned {
        if let Some(slot) = remaining.iter().position(|r| *r == assignment.role) {
            remaining.remove(slot);
        }
    }
    remaining
}

/// Uniform draw over the five pool slots (so soldier comes up 3 times in 5)
pub fn random_pool_role(rng: &mut GameRng) -> Role {
    ROLE_POOL[rng.random_index(ROLE_POOL.len())]
}

pub fn random_hero_type(rng: &mut GameRng) -> HeroType {
    HeroType::ALL[rng.random_index(HeroType::ALL.len())]
}
