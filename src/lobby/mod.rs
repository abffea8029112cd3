//! Match controller
//!
//! Owns every lobby's roster, teams, captains, roles and phase, and drives the
//! phase timers. The controller never simulates combat: battle intents are
//! relayed to the room and each participant resolves them locally.
//!
//! Time is explicit. Callers pass the current clock in milliseconds and the
//! registry fires every timer due up to that point, in order, before handling
//! the intent.

pub mod protocol;
pub mod roles;
pub mod room;
pub mod timers;

use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;
use thiserror::Error;

use crate::combat::GameRng;

use protocol::{
    AbilityKind, ActionType, Audience, ClientIntent, Envelope, LobbyId, MatchResultLabel, PlayerId,
    Position, ServerMessage,
};
use roles::{random_pool_role, HeroType, Role, RoleAssignment};
use room::{Lobby, MatchPhase, TEAM_SIZE};
use timers::{MatchTimings, ScheduledTimer, TimerKind, TimerQueue};

/// Why an intent was dropped. Nothing is broadcast for a rejected intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("player {0} is not seated in any lobby")]
    UnknownPlayer(PlayerId),
    #[error("player {0} is already seated in lobby {1}")]
    AlreadySeated(PlayerId, LobbyId),
    #[error("intent not accepted during {0:?}")]
    OutOfPhase(MatchPhase),
    #[error("player {0} is not a team captain")]
    NotCaptain(PlayerId),
    #[error("captain {0} cannot reassign their own role")]
    SelfAssignment(PlayerId),
    #[error("player {target} is not on team {team}")]
    WrongTeam { target: PlayerId, team: u8 },
    #[error("no {0:?} slot left in the team pool")]
    RoleUnavailable(Role),
    #[error("hero role assigned without a hero type")]
    MissingHeroType,
}

/// Every live lobby, the seat map, and the shared timer queue
#[derive(Resource)]
pub struct MatchRegistry {
    lobbies: BTreeMap<LobbyId, Lobby>,
    seats: HashMap<PlayerId, LobbyId>,
    timers: TimerQueue,
    next_lobby_id: LobbyId,
    timings: MatchTimings,
    rng: GameRng,
    outbox: Vec<Envelope>,
    now_ms: u64,
}

impl MatchRegistry {
    pub fn new(timings: MatchTimings, rng: GameRng) -> Self {
        Self {
            lobbies: BTreeMap::new(),
            seats: HashMap::new(),
            timers: TimerQueue::default(),
            next_lobby_id: 0,
            timings,
            rng,
            outbox: Vec::new(),
            now_ms: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn timings(&self) -> &MatchTimings {
        &self.timings
    }

    pub fn lobby(&self, id: LobbyId) -> Option<&Lobby> {
        self.lobbies.get(&id)
    }

    pub fn lobby_id_of(&self, player: &str) -> Option<LobbyId> {
        self.seats.get(player).copied()
    }

    pub fn lobby_of(&self, player: &str) -> Option<&Lobby> {
        self.lobby_id_of(player).and_then(|id| self.lobbies.get(&id))
    }

    pub fn lobbies(&self) -> impl Iterator<Item = &Lobby> {
        self.lobbies.values()
    }

    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take every broadcast queued since the last drain, in emission order
    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.outbox)
    }

    /// Fire every timer due at or before `now_ms`
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some(timer) = self.timers.pop_due(now_ms) {
            self.now_ms = self.now_ms.max(timer.due_ms);
            self.fire(timer);
        }
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn handle_intent(
        &mut self,
        now_ms: u64,
        sender: &str,
        intent: ClientIntent,
    ) -> Result<(), Rejection> {
        self.advance_to(now_ms);
        let result = match intent {
            ClientIntent::Join { name } => self.seat(sender, name).map(|_| ()),
            ClientIntent::AssignRole {
                target_id,
                role,
                hero_type,
            } => self.assign_role(sender, &target_id, role, hero_type),
            ClientIntent::PlayerAction {
                action,
                position,
                target_id,
            } => self.relay_action(sender, action, position, target_id),
            ClientIntent::PlayerDeath { killer_id } => self.report_death(sender, killer_id),
            ClientIntent::UseAbility {
                ability_type,
                target_id,
                position,
            } => self.report_ability(sender, ability_type, target_id, position),
        };
        if let Err(rejection) = &result {
            debug!("Dropped intent from {}: {}", sender, rejection);
        }
        result
    }

    /// Seat `player` in the oldest waiting lobby with room, creating one if needed
    pub fn join(&mut self, now_ms: u64, player: &str, name: &str) -> Result<LobbyId, Rejection> {
        self.advance_to(now_ms);
        self.seat(player, name.to_string())
    }

    /// Drop `player` from its lobby. Returns whether it was seated.
    pub fn disconnect(&mut self, now_ms: u64, player: &str) -> bool {
        self.advance_to(now_ms);
        let Some(lobby_id) = self.seats.remove(player) else {
            return false;
        };
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return true;
        };
        lobby.remove_player(player);

        if lobby.phase() == MatchPhase::Waiting && lobby.real_player_count() == 0 {
            self.lobbies.remove(&lobby_id);
            info!("Lobby {} emptied while waiting, discarded", lobby_id);
            return true;
        }

        let players = lobby.players().to_vec();
        info!("Player {} left lobby {}", player, lobby_id);
        self.emit(
            lobby_id,
            Audience::Room,
            ServerMessage::PlayerLeft {
                player_id: player.to_string(),
                players,
            },
        );
        true
    }

    fn emit(&mut self, lobby_id: LobbyId, audience: Audience, message: ServerMessage) {
        self.outbox.push(Envelope {
            lobby_id,
            audience,
            message,
        });
    }

    fn schedule(&mut self, lobby_id: LobbyId, delay_ms: u64, kind: TimerKind) {
        self.timers.schedule(self.now_ms + delay_ms, lobby_id, kind);
    }

    fn seat(&mut self, player: &str, name: String) -> Result<LobbyId, Rejection> {
        if let Some(lobby_id) = self.seats.get(player) {
            return Err(Rejection::AlreadySeated(player.to_string(), *lobby_id));
        }

        let lobby_id = self.find_or_create_lobby();
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return Err(Rejection::UnknownPlayer(player.to_string()));
        };
        lobby.add_player(player.to_string(), name, false);
        self.seats.insert(player.to_string(), lobby_id);

        let (team1, team2) = lobby.team_lists();
        let joined = ServerMessage::LobbyJoined {
            lobby_id,
            player_id: player.to_string(),
            players: lobby.players().to_vec(),
            team1,
            team2,
        };
        let updated = lobby_updated(lobby);
        info!(
            "Player {} joined lobby {} ({}/{})",
            player,
            lobby_id,
            lobby.player_count(),
            room::MAX_PLAYERS
        );

        self.emit(lobby_id, Audience::Player(player.to_string()), joined);
        self.emit(lobby_id, Audience::Room, updated);
        self.check_lobby_status(lobby_id);
        Ok(lobby_id)
    }

    fn find_or_create_lobby(&mut self) -> LobbyId {
        if let Some(lobby) = self
            .lobbies
            .values()
            .find(|l| l.phase() == MatchPhase::Waiting && !l.is_full())
        {
            return lobby.id;
        }

        let id = self.next_lobby_id;
        self.next_lobby_id += 1;
        self.lobbies.insert(id, Lobby::new(id, self.now_ms));
        self.schedule(id, self.timings.lobby_fill_ms, TimerKind::LobbyFill);
        info!("Created lobby {}", id);
        id
    }

    fn check_lobby_status(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if lobby.phase() != MatchPhase::Waiting {
            return;
        }
        if lobby.is_full() {
            self.start_role_selection(lobby_id);
            return;
        }
        if lobby.real_player_count() >= TEAM_SIZE && !lobby.autofill_armed {
            lobby.autofill_armed = true;
            self.schedule(lobby_id, self.timings.lobby_autofill_ms, TimerKind::LobbyAutoFill);
        }
    }

    fn fire(&mut self, timer: ScheduledTimer) {
        let id = timer.lobby_id;
        match timer.kind {
            TimerKind::LobbyFill => self.on_lobby_fill(id, false),
            TimerKind::LobbyAutoFill => self.on_lobby_fill(id, true),
            TimerKind::BotRoleAssign => self.auto_assign_bot_roles(id),
            TimerKind::RoleSelectionDeadline => self.on_role_selection_deadline(id),
            TimerKind::BattleStart => self.begin_combat(id),
            TimerKind::GameTick => self.game_tick(id),
        }
    }

    fn on_lobby_fill(&mut self, lobby_id: LobbyId, forced: bool) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if lobby.phase() != MatchPhase::Waiting || lobby.player_count() == 0 || lobby.is_full() {
            return;
        }
        let added = lobby.fill_with_bots();
        let updated = lobby_updated(lobby);
        info!(
            "Lobby {} {} fill: added {} bots",
            lobby_id,
            if forced { "forced" } else { "timed" },
            added
        );
        self.emit(lobby_id, Audience::Room, updated);
        self.start_role_selection(lobby_id);
    }

    fn start_role_selection(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if !lobby.advance_phase(MatchPhase::RoleSelection) {
            return;
        }
        lobby.role_selection_started_at_ms = Some(self.now_ms);
        lobby.elect_captains(&mut self.rng);

        let mut captain_roles = [None, None];
        for team in [1u8, 2] {
            if let Some(captain) = lobby.captain(team).cloned() {
                let role = random_pool_role(&mut self.rng);
                let assignment = RoleAssignment::for_role(role, &mut self.rng);
                lobby.set_role(team, captain, assignment);
                captain_roles[(team - 1) as usize] = Some(assignment);
            }
        }

        let message = ServerMessage::RoleSelectionStarted {
            team1_captain: lobby.captain(1).cloned(),
            team2_captain: lobby.captain(2).cloned(),
            team1_captain_role: captain_roles[0],
            team2_captain_role: captain_roles[1],
            time_limit: self.timings.role_selection_ms,
        };
        info!(
            "Lobby {} role selection started (captains {:?} / {:?})",
            lobby_id,
            lobby.captain(1),
            lobby.captain(2)
        );

        self.emit(lobby_id, Audience::Room, message);
        self.schedule(lobby_id, self.timings.bot_role_assign_ms, TimerKind::BotRoleAssign);
        self.schedule(
            lobby_id,
            self.timings.role_selection_ms,
            TimerKind::RoleSelectionDeadline,
        );
    }

    fn assign_role(
        &mut self,
        sender: &str,
        target: &str,
        role: Role,
        hero_type: Option<HeroType>,
    ) -> Result<(), Rejection> {
        let lobby_id = self
            .lobby_id_of(sender)
            .ok_or_else(|| Rejection::UnknownPlayer(sender.to_string()))?;
        let lobby = self
            .lobbies
            .get_mut(&lobby_id)
            .ok_or_else(|| Rejection::UnknownPlayer(sender.to_string()))?;

        if lobby.phase() != MatchPhase::RoleSelection {
            return Err(Rejection::OutOfPhase(lobby.phase()));
        }
        let team = lobby
            .captained_team(sender)
            .ok_or_else(|| Rejection::NotCaptain(sender.to_string()))?;
        if target == sender {
            return Err(Rejection::SelfAssignment(sender.to_string()));
        }
        if lobby.team_of(target) != Some(team) {
            return Err(Rejection::WrongTeam {
                target: target.to_string(),
                team,
            });
        }
        let assignment = match role {
            Role::Hero => RoleAssignment::hero(hero_type.ok_or(Rejection::MissingHeroType)?),
            Role::Wizard => RoleAssignment::wizard(),
            Role::Soldier => RoleAssignment::soldier(),
        };
        if !lobby.available_roles(team, Some(target)).contains(&role) {
            return Err(Rejection::RoleUnavailable(role));
        }

        lobby.set_role(team, target.to_string(), assignment);
        let team_complete = lobby.is_team_complete(team);
        let both_complete = lobby.is_team_complete(1) && lobby.is_team_complete(2);

        self.emit(
            lobby_id,
            Audience::Room,
            ServerMessage::RoleAssigned {
                team_num: team,
                player_id: target.to_string(),
                role: assignment.role,
                hero_type: assignment.hero_type,
            },
        );
        if team_complete {
            self.emit(
                lobby_id,
                Audience::Room,
                ServerMessage::TeamRolesComplete { team_num: team },
            );
        }
        if both_complete {
            self.start_battle(lobby_id);
        }
        Ok(())
    }

    fn auto_assign_bot_roles(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if lobby.phase() != MatchPhase::RoleSelection {
            return;
        }

        let mut messages = Vec::new();
        for team in [1u8, 2] {
            let bots: Vec<PlayerId> = lobby
                .unassigned(team)
                .into_iter()
                .filter(|id| lobby.is_bot(id))
                .collect();
            if bots.is_empty() {
                continue;
            }
            for bot in bots {
                let Some(role) = lobby.available_roles(team, None).first().copied() else {
                    warn!("Lobby {} team {} has no role left for {}", lobby_id, team, bot);
                    break;
                };
                let assignment = RoleAssignment::for_role(role, &mut self.rng);
                lobby.set_role(team, bot.clone(), assignment);
                messages.push(ServerMessage::RoleAssigned {
                    team_num: team,
                    player_id: bot,
                    role: assignment.role,
                    hero_type: assignment.hero_type,
                });
            }
            if lobby.is_team_complete(team) {
                messages.push(ServerMessage::TeamRolesComplete { team_num: team });
            }
        }
        let both_complete = lobby.is_team_complete(1) && lobby.is_team_complete(2);

        for message in messages {
            self.emit(lobby_id, Audience::Room, message);
        }
        if both_complete {
            self.start_battle(lobby_id);
        }
    }

    fn on_role_selection_deadline(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if lobby.phase() != MatchPhase::RoleSelection {
            return;
        }
        for team in [1u8, 2] {
            for player in lobby.unassigned(team) {
                let Some(role) = lobby.available_roles(team, None).first().copied() else {
                    break;
                };
                let assignment = RoleAssignment::for_role(role, &mut self.rng);
                debug!("Lobby {} deadline assigns {:?} to {}", lobby_id, role, player);
                lobby.set_role(team, player, assignment);
            }
        }
        info!("Lobby {} role selection deadline reached", lobby_id);
        self.start_battle(lobby_id);
    }

    fn start_battle(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if !lobby.advance_phase(MatchPhase::Battle) {
            return;
        }
        let countdown_ms = self.timings.battle_countdown_ms;
        info!("Lobby {} battle countdown started", lobby_id);
        self.emit(
            lobby_id,
            Audience::Room,
            ServerMessage::BattleCountdown {
                countdown: countdown_ms / 1000,
            },
        );
        self.schedule(lobby_id, countdown_ms, TimerKind::BattleStart);
    }

    fn begin_combat(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if lobby.phase() != MatchPhase::Battle || lobby.battle_started_at_ms.is_some() {
            return;
        }
        lobby.battle_started_at_ms = Some(self.now_ms);
        let (team1, team2) = lobby.team_lists();
        let message = ServerMessage::BattleStarted {
            roles: lobby.roster_roles(),
            team1,
            team2,
            bots: lobby.bots(),
        };
        info!("Lobby {} battle started", lobby_id);
        self.emit(lobby_id, Audience::Room, message);
        self.schedule(lobby_id, self.timings.game_tick_ms, TimerKind::GameTick);
    }

    fn game_tick(&mut self, lobby_id: LobbyId) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        let Some(started) = lobby.battle_started_at_ms else {
            return;
        };
        if lobby.phase() != MatchPhase::Battle {
            return;
        }

        let elapsed = self.now_ms.saturating_sub(started);
        lobby.game_time_ms = elapsed;
        let is_overtime = elapsed >= self.timings.main_time_ms;
        let overtime_edge = is_overtime && !lobby.overtime;
        if overtime_edge {
            lobby.overtime = true;
            info!("Lobby {} entered overtime", lobby_id);
            self.emit(lobby_id, Audience::Room, ServerMessage::OvertimeStarted);
        }
        self.emit(
            lobby_id,
            Audience::Room,
            ServerMessage::GameTimeUpdate {
                elapsed,
                is_overtime,
            },
        );

        if elapsed >= self.timings.draw_time_ms {
            self.end_game(lobby_id, MatchResultLabel::Draw);
        } else {
            self.schedule(lobby_id, self.timings.game_tick_ms, TimerKind::GameTick);
        }
    }

    fn end_game(&mut self, lobby_id: LobbyId, result: MatchResultLabel) {
        let Some(lobby) = self.lobbies.get_mut(&lobby_id) else {
            return;
        };
        if !lobby.advance_phase(MatchPhase::Finished) {
            return;
        }
        info!("Lobby {} finished: {:?}", lobby_id, result);
        self.emit(lobby_id, Audience::Room, ServerMessage::GameEnded { result });
        self.seats.retain(|_, seated| *seated != lobby_id);
    }

    /// Lobby of `player`, provided it is in battle
    fn battle_lobby_of(&self, player: &str) -> Result<LobbyId, Rejection> {
        let lobby = self
            .lobby_of(player)
            .ok_or_else(|| Rejection::UnknownPlayer(player.to_string()))?;
        if lobby.phase() != MatchPhase::Battle {
            return Err(Rejection::OutOfPhase(lobby.phase()));
        }
        Ok(lobby.id)
    }

    fn relay_action(
        &mut self,
        sender: &str,
        action: ActionType,
        position: Position,
        target_id: Option<PlayerId>,
    ) -> Result<(), Rejection> {
        let lobby_id = self.battle_lobby_of(sender)?;
        self.emit(
            lobby_id,
            Audience::RoomExcept(sender.to_string()),
            ServerMessage::PlayerAction {
                player_id: sender.to_string(),
                action,
                position,
                target_id,
            },
        );
        Ok(())
    }

    fn report_death(&mut self, sender: &str, killer_id: Option<PlayerId>) -> Result<(), Rejection> {
        let lobby_id = self.battle_lobby_of(sender)?;
        self.emit(
            lobby_id,
            Audience::Room,
            ServerMessage::PlayerDied {
                player_id: sender.to_string(),
                killer_id,
            },
        );
        Ok(())
    }

    fn report_ability(
        &mut self,
        sender: &str,
        ability_type: AbilityKind,
        target_id: Option<PlayerId>,
        position: Option<Position>,
    ) -> Result<(), Rejection> {
        let lobby_id = self.battle_lobby_of(sender)?;
        self.emit(
            lobby_id,
            Audience::Room,
            ServerMessage::AbilityUsed {
                player_id: sender.to_string(),
                ability_type,
                target_id,
                position,
            },
        );
        Ok(())
    }
}

fn lobby_updated(lobby: &Lobby) -> ServerMessage {
    let (team1, team2) = lobby.team_lists();
    ServerMessage::LobbyUpdated {
        players: lobby.players().to_vec(),
        team1,
        team2,
        player_count: lobby.player_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MatchRegistry {
        MatchRegistry::new(MatchTimings::default(), GameRng::from_seed(5))
    }

    #[test]
    fn join_sends_private_welcome_then_room_update() {
        let mut registry = registry();
        let lobby_id = registry.join(0, "p1", "Hector").unwrap();
        let outbox = registry.drain_outbox();
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[0].audience, Audience::Player("p1".into()));
        assert!(matches!(outbox[0].message, ServerMessage::LobbyJoined { .. }));
        assert_eq!(outbox[1].audience, Audience::Room);
        assert_eq!(outbox[1].lobby_id, lobby_id);
    }

    #[test]
    fn seated_player_cannot_join_twice() {
        let mut registry = registry();
        registry.join(0, "p1", "Hector").unwrap();
        assert_eq!(
            registry.join(5, "p1", "Hector"),
            Err(Rejection::AlreadySeated("p1".into(), 0))
        );
    }

    #[test]
    fn stale_fill_timer_is_ignored_after_lobby_disposal() {
        let mut registry = registry();
        registry.join(0, "p1", "Hector").unwrap();
        assert!(registry.disconnect(2_000, "p1"));
        assert!(registry.lobby(0).is_none());
        registry.drain_outbox();

        registry.advance_to(20_000);
        assert!(registry.drain_outbox().is_empty());
    }

    #[test]
    fn relay_is_rejected_outside_battle() {
        let mut registry = registry();
        registry.join(0, "p1", "Hector").unwrap();
        let result = registry.handle_intent(
            10,
            "p1",
            ClientIntent::PlayerDeath { killer_id: None },
        );
        assert_eq!(result, Err(Rejection::OutOfPhase(MatchPhase::Waiting)));
    }
}
