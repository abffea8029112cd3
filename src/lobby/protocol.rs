//! Wire protocol
//!
//! Inbound intents and outbound broadcasts, serialized as JSON objects of the
//! form `{"event": "...", "data": {...}}` with camelCase payload fields.

use std::collections::BTreeMap;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::roles::{HeroType, Role, RoleAssignment};

/// Participant identifier. Bots use `bot_{lobbyId}_{n}`.
pub type PlayerId = String;

/// Monotonic lobby identifier
pub type LobbyId = u64;

/// Arena position as it travels on the wire
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl From<Vec2> for Position {
    fn from(v: Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Position> for Vec2 {
    fn from(p: Position) -> Self {
        Vec2::new(p.x, p.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Move,
    Attack,
}

/// The four hero abilities as named on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityKind {
    Clone,
    Heal,
    Rage,
    Aegis,
}

impl AbilityKind {
    pub fn name(&self) -> &'static str {
        match self {
            AbilityKind::Clone => "Clone",
            AbilityKind::Heal => "Heal",
            AbilityKind::Rage => "Rage",
            AbilityKind::Aegis => "Aegis",
        }
    }

    pub fn of_hero(hero: HeroType) -> Self {
        match hero {
            HeroType::Achilles => AbilityKind::Clone,
            HeroType::Agamemnon => AbilityKind::Heal,
            HeroType::Menelaus => AbilityKind::Rage,
            HeroType::Odysseus => AbilityKind::Aegis,
        }
    }
}

/// Intents a participant sends. The sender id is implicit in the connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientIntent {
    Join {
        name: String,
    },
    #[serde(rename_all = "camelCase")]
    AssignRole {
        target_id: PlayerId,
        role: Role,
        #[serde(default)]
        hero_type: Option<HeroType>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerAction {
        #[serde(rename = "type")]
        action: ActionType,
        position: Position,
        #[serde(default)]
        target_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerDeath {
        #[serde(default)]
        killer_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    UseAbility {
        ability_type: AbilityKind,
        #[serde(default)]
        target_id: Option<PlayerId>,
        #[serde(default)]
        position: Option<Position>,
    },
}

/// One roster line as broadcast to the room
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub is_bot: bool,
}

/// Role assignments of both teams, keyed by participant id
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoles {
    pub team1: BTreeMap<PlayerId, RoleAssignment>,
    pub team2: BTreeMap<PlayerId, RoleAssignment>,
}

impl TeamRoles {
    pub fn team(&self, team: u8) -> &BTreeMap<PlayerId, RoleAssignment> {
        if team == 1 {
            &self.team1
        } else {
            &self.team2
        }
    }

    pub fn team_mut(&mut self, team: u8) -> &mut BTreeMap<PlayerId, RoleAssignment> {
        if team == 1 {
            &mut self.team1
        } else {
            &mut self.team2
        }
    }

    pub fn get(&self, player: &str) -> Option<&RoleAssignment> {
        self.team1.get(player).or_else(|| self.team2.get(player))
    }
}

/// Result label as seen from one participant's side
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResultLabel {
    Win,
    Lose,
    Draw,
}

/// Broadcasts from the controller, and relayed intents
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    LobbyJoined {
        lobby_id: LobbyId,
        player_id: PlayerId,
        players: Vec<RosterEntry>,
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    LobbyUpdated {
        players: Vec<RosterEntry>,
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        player_count: usize,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        player_id: PlayerId,
        players: Vec<RosterEntry>,
    },
    #[serde(rename_all = "camelCase")]
    RoleSelectionStarted {
        team1_captain: Option<PlayerId>,
        team2_captain: Option<PlayerId>,
        team1_captain_role: Option<RoleAssignment>,
        team2_captain_role: Option<RoleAssignment>,
        /// Milliseconds until unassigned seats are filled automatically
        time_limit: u64,
    },
    #[serde(rename_all = "camelCase")]
    RoleAssigned {
        team_num: u8,
        player_id: PlayerId,
        role: Role,
        hero_type: Option<HeroType>,
    },
    #[serde(rename_all = "camelCase")]
    TeamRolesComplete { team_num: u8 },
    /// Seconds until combat begins
    BattleCountdown { countdown: u64 },
    #[serde(rename_all = "camelCase")]
    BattleStarted {
        roles: TeamRoles,
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        bots: Vec<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerAction {
        player_id: PlayerId,
        #[serde(rename = "type")]
        action: ActionType,
        position: Position,
        target_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerDied {
        player_id: PlayerId,
        killer_id: Option<PlayerId>,
    },
    #[serde(rename_all = "camelCase")]
    AbilityUsed {
        player_id: PlayerId,
        ability_type: AbilityKind,
        target_id: Option<PlayerId>,
        position: Option<Position>,
    },
    OvertimeStarted,
    #[serde(rename_all = "camelCase")]
    GameTimeUpdate { elapsed: u64, is_overtime: bool },
    GameEnded { result: MatchResultLabel },
}

impl ServerMessage {
    /// Wire name of the event, as used in the `event` tag
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::LobbyJoined { .. } => "lobby_joined",
            ServerMessage::LobbyUpdated { .. } => "lobby_updated",
            ServerMessage::PlayerLeft { .. } => "player_left",
            ServerMessage::RoleSelectionStarted { .. } => "role_selection_started",
            ServerMessage::RoleAssigned { .. } => "role_assigned",
            ServerMessage::TeamRolesComplete { .. } => "team_roles_complete",
            ServerMessage::BattleCountdown { .. } => "battle_countdown",
            ServerMessage::BattleStarted { .. } => "battle_started",
            ServerMessage::PlayerAction { .. } => "player_action",
            ServerMessage::PlayerDied { .. } => "player_died",
            ServerMessage::AbilityUsed { .. } => "ability_used",
            ServerMessage::OvertimeStarted => "overtime_started",
            ServerMessage::GameTimeUpdate { .. } => "game_time_update",
            ServerMessage::GameEnded { .. } => "game_ended",
        }
    }
}

/// Who receives a broadcast within its lobby
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    /// Every seated participant
    Room,
    /// Every seated participant except the given one
    RoomExcept(PlayerId),
    /// Only the given participant
    Player(PlayerId),
}

/// An outbound message addressed to part of a lobby
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub lobby_id: LobbyId,
    pub audience: Audience,
    pub message: ServerMessage,
}

impl Envelope {
    /// Whether `player`, seated in `lobby_id`, should receive this message
    pub fn reaches(&self, lobby_id: LobbyId, player: &str) -> bool {
        if self.lobby_id != lobby_id {
            return false;
        }
        match &self.audience {
            Audience::Room => true,
            Audience::RoomExcept(excluded) => excluded != player,
            Audience::Player(only) => only == player,
        }
    }
}

pub fn encode_message(message: &ServerMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

pub fn decode_intent(text: &str) -> serde_json::Result<ClientIntent> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_decode_from_camel_case_json() {
        let intent = decode_intent(
            r#"{"event":"assign_role","data":{"targetId":"p2","role":"hero","heroType":"odysseus"}}"#,
        )
        .unwrap();
        assert_eq!(
            intent,
            ClientIntent::AssignRole {
                target_id: "p2".into(),
                role: Role::Hero,
                hero_type: Some(HeroType::Odysseus),
            }
        );

        let action = decode_intent(
            r#"{"event":"player_action","data":{"type":"attack","position":{"x":1.0,"y":2.0},"targetId":"bot_0_3"}}"#,
        )
        .unwrap();
        assert!(matches!(
            action,
            ClientIntent::PlayerAction {
                action: ActionType::Attack,
                ..
            }
        ));
    }

    #[test]
    fn broadcasts_carry_event_tag() {
        let text = encode_message(&ServerMessage::GameTimeUpdate {
            elapsed: 181_000,
            is_overtime: true,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "game_time_update");
        assert_eq!(value["data"]["isOvertime"], true);

        let ended = encode_message(&ServerMessage::GameEnded {
            result: MatchResultLabel::Draw,
        })
        .unwrap();
        assert!(ended.contains(r#""result":"draw""#));
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let message = ServerMessage::TeamRolesComplete { team_num: 2 };
        let value: serde_json::Value =
            serde_json::from_str(&encode_message(&message).unwrap()).unwrap();
        assert_eq!(value["event"], message.event_name());
        assert_eq!(value["data"]["teamNum"], 2);
    }

    #[test]
    fn audience_filters_recipients() {
        let envelope = Envelope {
            lobby_id: 3,
            audience: Audience::RoomExcept("a".into()),
            message: ServerMessage::OvertimeStarted,
        };
        assert!(!envelope.reaches(3, "a"));
        assert!(envelope.reaches(3, "b"));
        assert!(!envelope.reaches(4, "b"));
    }
}
