//! Participant session
//!
//! `ClientSession` is one participant's side of the relay model. It follows
//! the controller's broadcasts through the lobby and role selection, spawns
//! its own copy of the battle when combat starts, applies other participants'
//! relayed actions to that copy, and reports its own combatant's deaths and
//! ability uses back as intents.
//!
//! Win and loss are decided locally from this session's own view of which
//! team was wiped out. The controller only ever announces the timeout draw,
//! so two sessions whose simulations diverged can disagree on the result.

use bevy::prelude::*;

use crate::combat::{CombatLogEventType, GameRng, SimReport};
use crate::config::GameConfig;
use crate::lobby::protocol::{
    ActionType, ClientIntent, LobbyId, MatchResultLabel, PlayerId, Position, RosterEntry,
    ServerMessage, TeamRoles,
};
use crate::lobby::roles::{available_roles, RoleAssignment};

use super::combat_ai::BotBrain;
use super::combat_core::Battlefield;
use super::components::{CombatRole, Combatant, ControllerKind};

pub struct ClientSession {
    player_id: PlayerId,
    name: String,
    config: GameConfig,
    rng: GameRng,
    /// Drive our own combatant with the bot brain, and act as captain
    autopilot: bool,
    lobby_id: Option<LobbyId>,
    roster: Vec<RosterEntry>,
    team1: Vec<PlayerId>,
    team2: Vec<PlayerId>,
    captains: [Option<PlayerId>; 2],
    known_roles: TeamRoles,
    team: Option<u8>,
    countdown_secs: Option<u64>,
    battle: Option<Battlefield>,
    brains: Vec<BotBrain>,
    pilot: Option<BotBrain>,
    elapsed_ms: u64,
    overtime: bool,
    outcome: Option<MatchResultLabel>,
    outbox: Vec<ClientIntent>,
}

impl ClientSession {
    pub fn new(
        player_id: impl Into<PlayerId>,
        name: impl Into<String>,
        config: GameConfig,
        rng: GameRng,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            name: name.into(),
            config,
            rng,
            autopilot: false,
            lobby_id: None,
            roster: Vec::new(),
            team1: Vec::new(),
            team2: Vec::new(),
            captains: [None, None],
            known_roles: TeamRoles::default(),
            team: None,
            countdown_secs: None,
            battle: None,
            brains: Vec::new(),
            pilot: None,
            elapsed_ms: 0,
            overtime: false,
            outcome: None,
            outbox: Vec::new(),
        }
    }

    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    pub fn join_intent(&self) -> ClientIntent {
        ClientIntent::Join {
            name: self.name.clone(),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lobby_id(&self) -> Option<LobbyId> {
        self.lobby_id
    }

    pub fn team(&self) -> Option<u8> {
        self.team
    }

    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    pub fn captain(&self, team: u8) -> Option<&PlayerId> {
        self.captains
            .get(team.wrapping_sub(1) as usize)
            .and_then(|c| c.as_ref())
    }

    pub fn known_roles(&self) -> &TeamRoles {
        &self.known_roles
    }

    pub fn countdown_secs(&self) -> Option<u64> {
        self.countdown_secs
    }

    pub fn battlefield(&self) -> Option<&Battlefield> {
        self.battle.as_ref()
    }

    pub fn battlefield_mut(&mut self) -> Option<&mut Battlefield> {
        self.battle.as_mut()
    }

    /// Our own combatant, once the battle has started
    pub fn combatant(&self) -> Option<&Combatant> {
        self.battle.as_ref().and_then(|b| b.get(&self.player_id))
    }

    pub fn in_battle(&self) -> bool {
        self.battle.is_some() && self.outcome.is_none()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_overtime(&self) -> bool {
        self.overtime
    }

    pub fn outcome(&self) -> Option<MatchResultLabel> {
        self.outcome
    }

    fn team_list(&self, team: u8) -> &[PlayerId] {
        if team == 1 {
            &self.team1
        } else {
            &self.team2
        }
    }

    fn is_bot(&self, id: &str) -> bool {
        self.roster.iter().any(|p| p.id == id && p.is_bot)
    }

    fn display_name(&self, id: &str, fallback: String) -> String {
        self.roster
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
            .unwrap_or(fallback)
    }

    fn set_teams(&mut self, team1: &[PlayerId], team2: &[PlayerId]) {
        self.team1 = team1.to_vec();
        self.team2 = team2.to_vec();
        self.team = if team1.contains(&self.player_id) {
            Some(1)
        } else if team2.contains(&self.player_id) {
            Some(2)
        } else {
            self.team
        };
    }

    /// Apply one broadcast
    pub fn handle(&mut self, message: &ServerMessage) {
        match message {
            ServerMessage::LobbyJoined {
                lobby_id,
                players,
                team1,
                team2,
                ..
            } => {
                self.lobby_id = Some(*lobby_id);
                self.roster = players.clone();
                self.set_teams(team1, team2);
            }
            ServerMessage::LobbyUpdated {
                players,
                team1,
                team2,
                ..
            } => {
                self.roster = players.clone();
                self.set_teams(team1, team2);
            }
            ServerMessage::PlayerLeft { players, .. } => {
                self.roster = players.clone();
                self.team1.retain(|id| players.iter().any(|p| &p.id == id));
                self.team2.retain(|id| players.iter().any(|p| &p.id == id));
            }
            ServerMessage::RoleSelectionStarted {
                team1_captain,
                team2_captain,
                team1_captain_role,
                team2_captain_role,
                ..
            } => {
                self.captains = [team1_captain.clone(), team2_captain.clone()];
                for (team, captain, role) in [
                    (1u8, team1_captain, team1_captain_role),
                    (2u8, team2_captain, team2_captain_role),
                ] {
                    if let (Some(captain), Some(role)) = (captain, role) {
                        self.known_roles.team_mut(team).insert(captain.clone(), *role);
                    }
                }
                if self.autopilot {
                    self.assign_teammates();
                }
            }
            ServerMessage::RoleAssigned {
                team_num,
                player_id,
                role,
                hero_type,
            } => {
                self.known_roles.team_mut(*team_num).insert(
                    player_id.clone(),
                    RoleAssignment {
                        role: *role,
                        hero_type: *hero_type,
                    },
                );
            }
            ServerMessage::TeamRolesComplete { team_num } => {
                debug!("{}: team {} roles complete", self.player_id, team_num);
            }
            ServerMessage::BattleCountdown { countdown } => {
                self.countdown_secs = Some(*countdown);
            }
            ServerMessage::BattleStarted {
                roles,
                team1,
                team2,
                bots,
            } => self.start_battle(roles, team1, team2, bots),
            ServerMessage::PlayerAction {
                player_id,
                action,
                position,
                target_id,
            } => self.apply_remote_action(player_id, *action, *position, target_id.as_deref()),
            ServerMessage::PlayerDied {
                player_id,
                killer_id,
            } => {
                if let Some(field) = self.battle.as_mut() {
                    field.die(player_id, killer_id.as_deref());
                }
                self.check_win_condition();
            }
            ServerMessage::AbilityUsed {
                player_id,
                ability_type,
                ..
            } => {
                if player_id != &self.player_id {
                    if let Some(field) = self.battle.as_mut() {
                        field.apply_remote_ability(player_id, *ability_type);
                    }
                }
            }
            ServerMessage::OvertimeStarted => self.overtime = true,
            ServerMessage::GameTimeUpdate {
                elapsed,
                is_overtime,
            } => {
                self.elapsed_ms = *elapsed;
                self.overtime = *is_overtime;
            }
            ServerMessage::GameEnded { result } => self.end_game(*result),
        }
    }

    /// As captain, hand every unassigned human teammate the next open role.
    /// Bot seats are left to the controller.
    fn assign_teammates(&mut self) {
        let Some(team) = [1u8, 2]
            .into_iter()
            .find(|t| self.captain(*t) == Some(&self.player_id))
        else {
            return;
        };
        let pending: Vec<PlayerId> = self
            .team_list(team)
            .iter()
            .filter(|id| !self.is_bot(id))
            .filter(|id| !self.known_roles.team(team).contains_key(*id))
            .cloned()
            .collect();

        for target in pending {
            let Some(role) = available_roles(self.known_roles.team(team).values())
                .first()
                .copied()
            else {
                break;
            };
            let assignment = RoleAssignment::for_role(role, &mut self.rng);
            self.known_roles
                .team_mut(team)
                .insert(target.clone(), assignment);
            self.outbox.push(ClientIntent::AssignRole {
                target_id: target,
                role: assignment.role,
                hero_type: assignment.hero_type,
            });
        }
    }

    fn start_battle(
        &mut self,
        roles: &TeamRoles,
        team1: &[PlayerId],
        team2: &[PlayerId],
        bots: &[PlayerId],
    ) {
        self.set_teams(team1, team2);
        self.known_roles = roles.clone();

        let mut field = Battlefield::new(self.config.clone());
        let arena = self.config.arena;
        self.brains.clear();

        for (team, members) in [(1u8, team1), (2u8, team2)] {
            for (index, id) in members.iter().enumerate() {
                let Some(assignment) = roles.team(team).get(id) else {
                    warn!("{} has no role, not spawned", id);
                    continue;
                };
                let (Some(role), Some(stats)) = (
                    CombatRole::from_assignment(assignment),
                    self.config.stats.for_assignment(assignment),
                ) else {
                    warn!("{} has a malformed role, not spawned", id);
                    continue;
                };
                let is_bot = bots.contains(id);
                let fallback = if is_bot {
                    format!("Bot{}", index + 1)
                } else {
                    format!("Player{}", index + 1)
                };
                let controller = if is_bot {
                    ControllerKind::Bot
                } else {
                    ControllerKind::Human
                };
                let combatant = Combatant::new(
                    id.clone(),
                    self.display_name(id, fallback),
                    team,
                    role,
                    controller,
                    arena.seat_spawn(team, index),
                    stats,
                )
                .with_local_control(*id == self.player_id);
                if field.spawn(combatant) && is_bot {
                    self.brains.push(BotBrain::new(id.clone()));
                }
            }
        }

        self.pilot = (self.autopilot && field.get(&self.player_id).is_some())
            .then(|| BotBrain::new(self.player_id.clone()));
        info!(
            "{}: battle started with {} combatants",
            self.player_id,
            field.combatants().len()
        );
        self.battle = Some(field);
    }

    fn apply_remote_action(
        &mut self,
        actor: &str,
        action: ActionType,
        position: Position,
        target: Option<&str>,
    ) {
        if actor == self.player_id || self.outcome.is_some() {
            return;
        }
        let Some(field) = self.battle.as_mut() else {
            return;
        };
        if !field.get(actor).is_some_and(|c| c.alive) {
            return;
        }
        match action {
            ActionType::Move => field.move_toward(actor, position.into()),
            ActionType::Attack => {
                if let Some(target) = target {
                    field.attack(actor, target);
                }
            }
        }
    }

    /// Advance the local simulation by one frame and return the intents
    /// produced since the last step.
    pub fn step(&mut self, delta_ms: u64) -> Vec<ClientIntent> {
        if self.outcome.is_none() {
            if let Some(field) = self.battle.as_mut() {
                field.step(delta_ms);

                for brain in self.brains.iter_mut() {
                    brain.update(field, &mut self.rng);
                }

                if let Some(pilot) = self.pilot.as_mut() {
                    if let Some(decision) = pilot.update(field, &mut self.rng) {
                        let position = field
                            .get(&self.player_id)
                            .map(|c| Position::from(c.position))
                            .unwrap_or_default();
                        self.outbox.push(ClientIntent::PlayerAction {
                            action: ActionType::Move,
                            position,
                            target_id: None,
                        });
                        if decision.attack.is_some_and(|a| a.performed()) {
                            self.outbox.push(ClientIntent::PlayerAction {
                                action: ActionType::Attack,
                                position,
                                target_id: pilot.target().map(str::to_string),
                            });
                        }
                    }
                }

                for report in field.drain_reports() {
                    self.outbox.push(match report {
                        SimReport::Death { killer, .. } => {
                            ClientIntent::PlayerDeath { killer_id: killer }
                        }
                        SimReport::AbilityUsed { kind, position, .. } => ClientIntent::UseAbility {
                            ability_type: kind,
                            target_id: None,
                            position: Some(position.into()),
                        },
                    });
                }

                for c in field.combatants() {
                    if c.alive
                        && c.is_clone()
                        && !self.brains.iter().any(|b| b.combatant_id == c.id)
                    {
                        self.brains.push(BotBrain::new(c.id.clone()));
                    }
                }
            }
            self.check_win_condition();
        }
        std::mem::take(&mut self.outbox)
    }

    fn check_win_condition(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let (Some(field), Some(team)) = (self.battle.as_ref(), self.team) else {
            return;
        };
        let team1_out = field.team_alive_count(1) == 0;
        let team2_out = field.team_alive_count(2) == 0;
        let label = match (team1_out, team2_out) {
            (true, true) => MatchResultLabel::Draw,
            (true, false) if team == 2 => MatchResultLabel::Win,
            (false, true) if team == 1 => MatchResultLabel::Win,
            (true, false) | (false, true) => MatchResultLabel::Lose,
            (false, false) => return,
        };
        self.end_game(label);
    }

    fn end_game(&mut self, result: MatchResultLabel) {
        if self.outcome.is_some() {
            return;
        }
        if let Some(field) = self.battle.as_mut() {
            let now = field.now_ms();
            field.log.log(
                now,
                CombatLogEventType::MatchEvent,
                format!("Match over: {:?}", result),
            );
        }
        info!("{}: match over, {:?}", self.player_id, result);
        self.outcome = Some(result);
    }
}
