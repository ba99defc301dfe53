//! Flat CSV export of a battle's event trace, one row per event.

use std::io::Write;

use serde::Serialize;

use crate::combat::events::BattleEvent;

/// One CSV row. Columns that do not apply to an event are left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub turn: u32,
    pub event_type: &'static str,
    pub army: Option<String>,
    pub troop: Option<String>,
    pub target_army: Option<String>,
    pub target: Option<String>,
    pub skill: Option<String>,
    pub damage: Option<f64>,
    pub troops_lost: Option<f64>,
    pub message: String,
}

impl EventRow {
    fn blank(event: &BattleEvent) -> Self {
        Self {
            turn: event.turn(),
            event_type: event.event_type(),
            army: None,
            troop: None,
            target_army: None,
            target: None,
            skill: None,
            damage: None,
            troops_lost: None,
            message: event.to_string(),
        }
    }
}

impl From<&BattleEvent> for EventRow {
    fn from(event: &BattleEvent) -> Self {
        let mut row = Self::blank(event);
        match event {
            BattleEvent::TurnStarted { .. } | BattleEvent::BattleEnded { .. } => {}
            BattleEvent::BurnTick {
                army,
                troop,
                damage,
                troops_lost,
                ..
            } => {
                row.army = Some(army.clone());
                row.troop = Some(troop.to_string());
                row.damage = Some(*damage);
                row.troops_lost = Some(*troops_lost);
            }
            BattleEvent::Stunned { army, troop, .. }
            | BattleEvent::TroopDefeated { army, troop, .. } => {
                row.army = Some(army.clone());
                row.troop = Some(troop.to_string());
            }
            BattleEvent::SkillActivated {
                army, actor, skill, ..
            } => {
                row.army = Some(army.clone());
                row.troop = Some(actor.to_string());
                row.skill = Some(skill.clone());
            }
            BattleEvent::StatusApplied {
                army, troop, skill, ..
            } => {
                row.target_army = Some(army.clone());
                row.target = troop.map(|kind| kind.to_string());
                row.skill = Some(skill.clone());
            }
            BattleEvent::TargetRedirected {
                army,
                actor,
                target,
                skill,
                ..
            } => {
                row.army = Some(army.clone());
                row.troop = Some(actor.to_string());
                row.target = Some(target.to_string());
                row.skill = Some(skill.clone());
            }
            BattleEvent::Attack {
                army,
                actor,
                defender_army,
                target,
                damage,
                troops_lost,
                ..
            } => {
                row.army = Some(army.clone());
                row.troop = Some(actor.to_string());
                row.target_army = Some(defender_army.clone());
                row.target = Some(target.to_string());
                row.damage = Some(*damage);
                row.troops_lost = Some(*troops_lost);
            }
        }
        row
    }
}

/// Writes a header row followed by one row per event.
pub fn write_events_csv<W: Write>(events: &[BattleEvent], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for event in events {
        out.serialize(EventRow::from(event))?;
    }
    out.flush()?;
    Ok(())
}
