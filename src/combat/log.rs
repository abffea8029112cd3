//! Combat logging
//!
//! Records every combat event a simulation applies, for post-match analysis
//! and the headless report.

use serde::Serialize;

/// A single entry in the combat log
#[derive(Debug, Clone, Serialize)]
pub struct CombatLogEntry {
    /// Simulation clock in milliseconds when the event happened
    pub timestamp_ms: u64,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    /// Structured payload for events that carry one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<StructuredEventData>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Ability used
    AbilityUsed,
    /// Freeze applied
    Freeze,
    /// Combatant died
    Death,
    /// Match event (spawn, end, etc.)
    MatchEvent,
}

/// Machine-readable details attached to a log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredEventData {
    Damage {
        source: Option<String>,
        target: String,
        /// Total damage including the shield-absorbed part
        amount: f32,
        absorbed: f32,
        is_killing_blow: bool,
    },
    Healing {
        source: String,
        target: String,
        amount: f32,
    },
    Ability {
        caster: String,
        ability: String,
    },
    Freeze {
        source: Option<String>,
        target: String,
        duration_ms: u64,
    },
    Death {
        victim: String,
        killer: Option<String>,
    },
}

/// Chronological record of one simulation's events
#[derive(Debug, Clone, Default, Serialize)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
}

impl CombatLog {
    /// Clear the log for a new match
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Add a new entry to the log
    pub fn log(&mut self, timestamp_ms: u64, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp_ms,
            event_type,
            message,
            data: None,
        });
    }

    fn log_structured(
        &mut self,
        timestamp_ms: u64,
        event_type: CombatLogEventType,
        message: String,
        data: StructuredEventData,
    ) {
        self.entries.push(CombatLogEntry {
            timestamp_ms,
            event_type,
            message,
            data: Some(data),
        });
    }

    pub fn log_damage(
        &mut self,
        timestamp_ms: u64,
        source: Option<&str>,
        target: &str,
        amount: f32,
        absorbed: f32,
        is_killing_blow: bool,
    ) {
        let message = match source {
            Some(source) => format!("{} hits {} for {:.0}", source, target, amount),
            None => format!("{} takes {:.0} damage", target, amount),
        };
        self.log_structured(
            timestamp_ms,
            CombatLogEventType::Damage,
            message,
            StructuredEventData::Damage {
                source: source.map(str::to_string),
                target: target.to_string(),
                amount,
                absorbed,
                is_killing_blow,
            },
        );
    }

    pub fn log_healing(&mut self, timestamp_ms: u64, source: &str, target: &str, amount: f32) {
        self.log_structured(
            timestamp_ms,
            CombatLogEventType::Healing,
            format!("{} heals {} for {:.0}", source, target, amount),
            StructuredEventData::Healing {
                source: source.to_string(),
                target: target.to_string(),
                amount,
            },
        );
    }

    pub fn log_ability(&mut self, timestamp_ms: u64, caster: &str, ability: &str) {
        self.log_structured(
            timestamp_ms,
            CombatLogEventType::AbilityUsed,
            format!("{} uses {}", caster, ability),
            StructuredEventData::Ability {
                caster: caster.to_string(),
                ability: ability.to_string(),
            },
        );
    }

    pub fn log_freeze(
        &mut self,
        timestamp_ms: u64,
        source: Option<&str>,
        target: &str,
        duration_ms: u64,
    ) {
        self.log_structured(
            timestamp_ms,
            CombatLogEventType::Freeze,
            format!("{} is frozen for {:.1}s", target, duration_ms as f32 / 1000.0),
            StructuredEventData::Freeze {
                source: source.map(str::to_string),
                target: target.to_string(),
                duration_ms,
            },
        );
    }

    pub fn log_death(&mut self, timestamp_ms: u64, victim: &str, killer: Option<&str>) {
        let message = match killer {
            Some(killer) => format!("{} was slain by {}", victim, killer),
            None => format!("{} died", victim),
        };
        self.log_structured(
            timestamp_ms,
            CombatLogEventType::Death,
            message,
            StructuredEventData::Death {
                victim: victim.to_string(),
                killer: killer.map(str::to_string),
            },
        );
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Total damage recorded with `source` as the attacker
    pub fn damage_dealt_by(&self, source: &str) -> f32 {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::Damage {
                    source: Some(s),
                    amount,
                    ..
                }) if s == source => Some(*amount),
                _ => None,
            })
            .sum()
    }

    /// Killing blows landed by `source`
    pub fn killing_blows_by(&self, source: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    &e.data,
                    Some(StructuredEventData::Damage {
                        source: Some(s),
                        is_killing_blow: true,
                        ..
                    }) if s == source
                )
            })
            .count()
    }

    /// Total freeze duration applied to `target`. Overlapping freezes are
    /// counted in full.
    pub fn freeze_ms_on(&self, target: &str) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::Freeze {
                    target: t,
                    duration_ms,
                    ..
                }) if t == target => Some(*duration_ms),
                _ => None,
            })
            .sum()
    }

    /// Ids of every combatant that died, in order of death
    pub fn deaths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| match &e.data {
                Some(StructuredEventData::Death { victim, .. }) => Some(victim.as_str()),
                _ => None,
            })
            .collect()
    }
}
