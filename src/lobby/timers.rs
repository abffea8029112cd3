//! Phase timers
//!
//! Timers are never cancelled. Each one re-checks the lobby's phase when it
//! fires and does nothing if an earlier transition superseded it.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use super::protocol::LobbyId;

/// Lobby fill check after creation
pub const LOBBY_FILL_MS: u64 = 10_000;
/// Forced bot fill once five real participants are seated
pub const LOBBY_AUTOFILL_MS: u64 = 30_000;
/// Bot seats receive roles this long after role selection opens
pub const BOT_ROLE_ASSIGN_MS: u64 = 1_000;
/// Role selection deadline
pub const ROLE_SELECTION_MS: u64 = 90_000;
/// Countdown between role completion and combat
pub const BATTLE_COUNTDOWN_MS: u64 = 10_000;
/// Game clock tick
pub const GAME_TICK_MS: u64 = 1_000;
/// Main time; overtime starts here
pub const MAIN_TIME_MS: u64 = 180_000;
/// Battle ends as a draw here
pub const DRAW_TIME_MS: u64 = 240_000;

/// Controller timings, overridable from `game.ron`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTimings {
    pub lobby_fill_ms: u64,
    pub lobby_autofill_ms: u64,
    pub bot_role_assign_ms: u64,
    pub role_selection_ms: u64,
    pub battle_countdown_ms: u64,
    pub game_tick_ms: u64,
    pub main_time_ms: u64,
    pub draw_time_ms: u64,
}

impl Default for MatchTimings {
    fn default() -> Self {
        Self {
            lobby_fill_ms: LOBBY_FILL_MS,
            lobby_autofill_ms: LOBBY_AUTOFILL_MS,
            bot_role_assign_ms: BOT_ROLE_ASSIGN_MS,
            role_selection_ms: ROLE_SELECTION_MS,
            battle_countdown_ms: BATTLE_COUNTDOWN_MS,
            game_tick_ms: GAME_TICK_MS,
            main_time_ms: MAIN_TIME_MS,
            draw_time_ms: DRAW_TIME_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    LobbyFill,
    LobbyAutoFill,
    BotRoleAssign,
    RoleSelectionDeadline,
    BattleStart,
    GameTick,
}

/// A pending timer. Ordered by due time, then by scheduling order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScheduledTimer {
    pub due_ms: u64,
    seq: u64,
    pub lobby_id: LobbyId,
    pub kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<ScheduledTimer>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, due_ms: u64, lobby_id: LobbyId, kind: TimerKind) {
        let timer = ScheduledTimer {
            due_ms,
            seq: self.next_seq,
            lobby_id,
            kind,
        };
        self.next_seq += 1;
        self.heap.push(Reverse(timer));
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTimer> {
        match self.heap.peek() {
            Some(Reverse(timer)) if timer.due_ms <= now_ms => self.heap.pop().map(|r| r.0),
            _ => None,
        }
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|r| r.0.due_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
