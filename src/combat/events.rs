//! Structured battle events and the collector that buffers them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::engine::BattleOutcome;
use crate::combat::skills::EffectType;
use crate::combat::status::StatusKind;
use crate::combat::troop::TroopKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    /// No events are recorded; used for bulk forecasting.
    Off,
    #[default]
    Events,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BattleEvent {
    TurnStarted {
        turn: u32,
    },
    BurnTick {
        turn: u32,
        army: String,
        troop: TroopKind,
        damage: f64,
        troops_lost: f64,
    },
    Stunned {
        turn: u32,
        army: String,
        troop: TroopKind,
    },
    SkillActivated {
        turn: u32,
        army: String,
        actor: TroopKind,
        skill: String,
        effect: EffectType,
    },
    /// `troop` is `None` for army-wide effects.
    StatusApplied {
        turn: u32,
        army: String,
        troop: Option<TroopKind>,
        status: StatusKind,
        skill: String,
    },
    TargetRedirected {
        turn: u32,
        army: String,
        actor: TroopKind,
        target: TroopKind,
        skill: String,
    },
    Attack {
        turn: u32,
        army: String,
        actor: TroopKind,
        defender_army: String,
        target: TroopKind,
        engaged: u64,
        damage: f64,
        troops_lost: f64,
        /// Second hit granted by a multi-attack skill.
        follow_up: bool,
    },
    TroopDefeated {
        turn: u32,
        army: String,
        troop: TroopKind,
    },
    BattleEnded {
        turns: u32,
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    pub fn turn(&self) -> u32 {
        match self {
            Self::TurnStarted { turn }
            | Self::BurnTick { turn, .. }
            | Self::Stunned { turn, .. }
            | Self::SkillActivated { turn, .. }
            | Self::StatusApplied { turn, .. }
            | Self::TargetRedirected { turn, .. }
            | Self::Attack { turn, .. }
            | Self::TroopDefeated { turn, .. } => *turn,
            Self::BattleEnded { turns, .. } => *turns,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStarted { .. } => "turn_started",
            Self::BurnTick { .. } => "burn_tick",
            Self::Stunned { .. } => "stunned",
            Self::SkillActivated { .. } => "skill_activated",
            Self::StatusApplied { .. } => "status_applied",
            Self::TargetRedirected { .. } => "target_redirected",
            Self::Attack { .. } => "attack",
            Self::TroopDefeated { .. } => "troop_defeated",
            Self::BattleEnded { .. } => "battle_ended",
        }
    }
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnStarted { turn } => write!(f, "--- Turn {turn} ---"),
            Self::BurnTick {
                army,
                troop,
                damage,
                ..
            } => write!(f, "{army}'s {troop} takes {damage:.2} burn damage from burn effect."),
            Self::Stunned { army, troop, .. } => {
                write!(f, "{army}'s {troop} is stunned and cannot act this turn.")
            }
            Self::SkillActivated {
                army, actor, skill, ..
            } => write!(f, "{army}'s {actor} skill '{skill}' activated!"),
            Self::StatusApplied {
                army,
                troop,
                status,
                skill,
                ..
            } => match (troop, status) {
                (Some(troop), StatusKind::Stun) => {
                    write!(f, "{army}'s {troop} is stunned by '{skill}'.")
                }
                (Some(troop), StatusKind::Burn) => {
                    write!(f, "{army}'s {troop} is burning from '{skill}'.")
                }
                (Some(troop), StatusKind::DamageTakenIncrease) => {
                    write!(f, "{army}'s {troop} takes increased damage from '{skill}'.")
                }
                (Some(troop), StatusKind::DamageDecrease) => {
                    write!(f, "{army}'s {troop} takes reduced damage from '{skill}'.")
                }
                (None, _) => write!(f, "{army}'s troops take reduced damage from '{skill}'."),
            },
            Self::TargetRedirected {
                army,
                actor,
                target,
                skill,
                ..
            } => write!(
                f,
                "{army}'s {actor} skill '{skill}' activated! Attacking {target} directly."
            ),
            Self::Attack {
                army,
                actor,
                defender_army,
                target,
                engaged,
                damage,
                follow_up,
                ..
            } => {
                if *follow_up {
                    write!(f, "{army}'s {actor} attacks again, dealing {damage:.2} damage.")
                } else {
                    write!(
                        f,
                        "{army}'s {actor} attacks {defender_army}'s {target} with {engaged} \
                         troops, dealing {damage:.2} damage."
                    )
                }
            }
            Self::TroopDefeated { army, troop, .. } => {
                write!(f, "{army}'s {troop} has been defeated!")
            }
            Self::BattleEnded { turns, outcome } => {
                write!(f, "Battle ended after {turns} turns: {outcome}")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TraceCollector {
    enabled: bool,
    events: Vec<BattleEvent>,
}

impl TraceCollector {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    pub fn from_mode(mode: TraceMode) -> Self {
        Self::new(mode == TraceMode::Events)
    }

    pub fn record(&mut self, event: BattleEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    /// Builds the event only when tracing is on.
    pub fn record_with(&mut self, build: impl FnOnce() -> BattleEvent) {
        if self.enabled {
            self.events.push(build());
        }
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, BattleEvent> {
        self.events.drain(..)
    }
}

pub fn serialize_events_json(events: &[BattleEvent]) -> Result<String, serde_json::Error> {
    serde_json::to_string(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_collector_records_only_when_enabled() {
        let event = BattleEvent::TurnStarted { turn: 1 };

        let mut trace_on = TraceCollector::new(true);
        trace_on.record(event.clone());
        assert_eq!(trace_on.events().len(), 1);

        let mut trace_off = TraceCollector::from_mode(TraceMode::Off);
        trace_off.record(event);
        let mut built = false;
        trace_off.record_with(|| {
            built = true;
            BattleEvent::TurnStarted { turn: 2 }
        });
        assert!(trace_off.events().is_empty());
        assert!(!built);
    }

    #[test]
    fn serialized_events_are_tagged_by_type() {
        let json = serialize_events_json(&[BattleEvent::Attack {
            turn: 3,
            army: "Dave".to_string(),
            actor: TroopKind::Lancer,
            defender_army: "Brabo".to_string(),
            target: TroopKind::Marksman,
            engaged: 12,
            damage: 1.5,
            troops_lost: 0.25,
            follow_up: false,
        }])
        .expect("serialization should succeed");

        let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(parsed[0]["event_type"], "attack");
        assert_eq!(parsed[0]["turn"], 3);
        assert_eq!(parsed[0]["actor"], "Lancer");
        assert_eq!(parsed[0]["target"], "Marksman");
        assert_eq!(parsed[0]["engaged"], 12);
    }

    #[test]
    fn display_renders_log_lines() {
        let stunned = BattleEvent::Stunned {
            turn: 2,
            army: "Brabo".to_string(),
            troop: TroopKind::Infantry,
        };
        assert_eq!(
            stunned.to_string(),
            "Brabo's Infantry is stunned and cannot act this turn."
        );
        let attack = BattleEvent::Attack {
            turn: 1,
            army: "Dave".to_string(),
            actor: TroopKind::Infantry,
            defender_army: "Brabo".to_string(),
            target: TroopKind::Infantry,
            engaged: 300,
            damage: 3000.0,
            troops_lost: 100.0,
            follow_up: false,
        };
        assert_eq!(
            attack.to_string(),
            "Dave's Infantry attacks Brabo's Infantry with 300 troops, dealing 3000.00 damage."
        );
        assert_eq!(attack.event_type(), "attack");
        assert_eq!(attack.turn(), 1);
    }
}
