//! Per-match record: roster, teams, captains, roles and phase.

use serde::{Deserialize, Serialize};

use crate::combat::GameRng;

use super::protocol::{LobbyId, PlayerId, RosterEntry, TeamRoles};
use super::roles::{available_roles, Role, RoleAssignment};

pub const MAX_PLAYERS: usize = 10;
pub const TEAM_SIZE: usize = 5;

/// Match lifecycle. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    Waiting,
    RoleSelection,
    Battle,
    Finished,
}

#[derive(Clone, Debug)]
pub struct Lobby {
    pub id: LobbyId,
    phase: MatchPhase,
    players: Vec<RosterEntry>,
    team1: Vec<PlayerId>,
    team2: Vec<PlayerId>,
    captains: [Option<PlayerId>; 2],
    roles: TeamRoles,
    bots_added: usize,
    pub created_at_ms: u64,
    pub role_selection_started_at_ms: Option<u64>,
    pub battle_started_at_ms: Option<u64>,
    pub game_time_ms: u64,
    pub overtime: bool,
    pub autofill_armed: bool,
}

impl Lobby {
    pub fn new(id: LobbyId, now_ms: u64) -> Self {
        Self {
            id,
            phase: MatchPhase::Waiting,
            players: Vec::new(),
            team1: Vec::new(),
            team2: Vec::new(),
            captains: [None, None],
            roles: TeamRoles::default(),
            bots_added: 0,
            created_at_ms: now_ms,
            role_selection_started_at_ms: None,
            battle_started_at_ms: None,
            game_time_ms: 0,
            overtime: false,
            autofill_armed: false,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Move to `next` if it is strictly later. Returns whether the phase changed.
    pub fn advance_phase(&mut self, next: MatchPhase) -> bool {
        if next > self.phase {
            self.phase = next;
            true
        } else {
            false
        }
    }

    pub fn players(&self) -> &[RosterEntry] {
        &self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn real_player_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_bot).count()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn contains(&self, player: &str) -> bool {
        self.players.iter().any(|p| p.id == player)
    }

    pub fn is_bot(&self, player: &str) -> bool {
        self.players.iter().any(|p| p.id == player && p.is_bot)
    }

    pub fn team(&self, team: u8) -> &[PlayerId] {
        if team == 1 {
            &self.team1
        } else {
            &self.team2
        }
    }

    pub fn team_of(&self, player: &str) -> Option<u8> {
        if self.team1.iter().any(|p| p == player) {
            Some(1)
        } else if self.team2.iter().any(|p| p == player) {
            Some(2)
        } else {
            None
        }
    }

    pub fn bots(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_bot)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Seat a participant on the smaller team (team 1 on ties)
    pub fn add_player(&mut self, id: PlayerId, name: String, is_bot: bool) -> bool {
        if self.is_full() || self.contains(&id) {
            return false;
        }
        if self.team1.len() <= self.team2.len() {
            self.team1.push(id.clone());
        } else {
            self.team2.push(id.clone());
        }
        self.players.push(RosterEntry { id, name, is_bot });
        true
    }

    /// Remove a participant from the roster, its team, and the role table
    pub fn remove_player(&mut self, id: &str) -> bool {
        let before = self.players.len();
        self.players.retain(|p| p.id != id);
        self.team1.retain(|p| p != id);
        self.team2.retain(|p| p != id);
        self.roles.team1.remove(id);
        self.roles.team2.remove(id);
        before != self.players.len()
    }

    /// Top the roster up to ten with bots. Returns how many were added.
    pub fn fill_with_bots(&mut self) -> usize {
        let mut added = 0;
        while !self.is_full() {
            let id = format!("bot_{}_{}", self.id, self.bots_added);
            let name = format!("Bot{}", self.bots_added + 1);
            self.bots_added += 1;
            if self.add_player(id, name, true) {
                added += 1;
            }
        }
        added
    }

    /// Pick a random real member of each team as captain, falling back to
    /// the first member when a team has no real participants.
    pub fn elect_captains(&mut self, rng: &mut GameRng) {
        for team in [1u8, 2] {
            let members = self.team(team);
            let real: Vec<PlayerId> = members
                .iter()
                .filter(|id| !self.is_bot(id))
                .cloned()
                .collect();
            let captain = rng
                .choose(&real)
                .cloned()
                .or_else(|| members.first().cloned());
            self.captains[(team - 1) as usize] = captain;
        }
    }

    pub fn captain(&self, team: u8) -> Option<&PlayerId> {
        self.captains
            .get(team.wrapping_sub(1) as usize)
            .and_then(|c| c.as_ref())
    }

    /// Team on which `player` is captain
    pub fn captained_team(&self, player: &str) -> Option<u8> {
        [1u8, 2]
            .into_iter()
            .find(|team| self.captain(*team).map(String::as_str) == Some(player))
    }

    pub fn roles(&self) -> &TeamRoles {
        &self.roles
    }

    pub fn role_of(&self, player: &str) -> Option<&RoleAssignment> {
        self.roles.get(player)
    }

    pub fn set_role(&mut self, team: u8, player: PlayerId, assignment: RoleAssignment) {
        self.roles.team_mut(team).insert(player, assignment);
    }

    /// Pool slots still open on `team`, ignoring `excluding`'s own entry
    pub fn available_roles(&self, team: u8, excluding: Option<&str>) -> Vec<Role> {
        let members = self.team(team);
        available_roles(
            self.roles
                .team(team)
                .iter()
                .filter(|(id, _)| members.contains(id))
                .filter(|(id, _)| Some(id.as_str()) != excluding)
                .map(|(_, a)| a),
        )
    }

    /// Every current member of the team holds a role
    pub fn is_team_complete(&self, team: u8) -> bool {
        let assigned = self.roles.team(team);
        let members = self.team(team);
        !members.is_empty() && members.iter().all(|id| assigned.contains_key(id))
    }

    /// Members of `team` without a role, in seating order
    pub fn unassigned(&self, team: u8) -> Vec<PlayerId> {
        let assigned = self.roles.team(team);
        self.team(team)
            .iter()
            .filter(|id| !assigned.contains_key(*id))
            .cloned()
            .collect()
    }

    /// Role table restricted to the current roster
    pub fn roster_roles(&self) -> TeamRoles {
        let mut roles = TeamRoles::default();
        for team in [1u8, 2] {
            let members = self.team(team);
            for (id, assignment) in self.roles.team(team) {
                if members.contains(id) {
                    roles.team_mut(team).insert(id.clone(), *assignment);
                }
            }
        }
        roles
    }

    pub fn team_lists(&self) -> (Vec<PlayerId>, Vec<PlayerId>) {
        (self.team1.clone(), self.team2.clone())
    }
}
