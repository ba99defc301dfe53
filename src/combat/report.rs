//! End-of-battle summary per army and its plain-text rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::combat::army::Army;
use crate::combat::engine::{BattleOutcome, Side};
use crate::combat::troop::{TroopGroup, TroopKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TroopSummary {
    pub troop: TroopKind,
    pub kills: f64,
    pub starting_count: f64,
    pub remaining: f64,
    pub lightly_injured: f64,
    pub severely_injured: f64,
}

impl From<&TroopGroup> for TroopSummary {
    fn from(troop: &TroopGroup) -> Self {
        Self {
            troop: troop.kind,
            kills: troop.kills(),
            starting_count: troop.initial_count(),
            remaining: troop.count(),
            lightly_injured: troop.lightly_injured(),
            severely_injured: troop.severely_injured(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArmySummary {
    pub side: Side,
    pub name: String,
    pub total_kills: f64,
    pub total_injured: f64,
    pub survivors: f64,
    pub troops: Vec<TroopSummary>,
    pub skills_activated: BTreeMap<String, u32>,
}

impl ArmySummary {
    pub fn new(side: Side, army: &Army) -> Self {
        let troops: Vec<TroopSummary> = army.troops().iter().map(TroopSummary::from).collect();
        Self {
            side,
            name: army.name.clone(),
            total_kills: troops.iter().map(|t| t.kills).sum(),
            total_injured: troops
                .iter()
                .map(|t| t.lightly_injured + t.severely_injured)
                .sum(),
            survivors: troops.iter().map(|t| t.remaining).sum(),
            troops,
            skills_activated: army.skill_activations().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BattleReport {
    pub turns: u32,
    /// `None` while the battle is still running.
    pub outcome: Option<BattleOutcome>,
    pub armies: Vec<ArmySummary>,
}

impl BattleReport {
    pub fn new(turns: u32, outcome: Option<BattleOutcome>, armies: &[Army; 2]) -> Self {
        Self {
            turns,
            outcome,
            armies: Side::BOTH
                .into_iter()
                .map(|side| ArmySummary::new(side, &armies[side.index()]))
                .collect(),
        }
    }

    pub fn army(&self, side: Side) -> Option<&ArmySummary> {
        self.armies.iter().find(|army| army.side == side)
    }

    /// Winner's army name, `"Draw"`, or `"Undecided"` for an unfinished battle.
    pub fn winner_label(&self) -> String {
        match self.outcome {
            None => "Undecided".to_string(),
            Some(BattleOutcome::Draw) => "Draw".to_string(),
            Some(
                outcome @ (BattleOutcome::Victory(side) | BattleOutcome::TurnLimitReached(side)),
            ) => {
                let name = self
                    .army(side)
                    .map(|army| army.name.clone())
                    .unwrap_or_else(|| side.to_string());
                if outcome.by_turn_limit() {
                    format!("{name} (turn limit reached)")
                } else {
                    name
                }
            }
        }
    }
}

/// Renders the report in the classic battle-report layout. Counts are floored.
pub fn render_text(report: &BattleReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- Battle Report ---");
    let _ = writeln!(out, "Total Turns: {}", report.turns);
    let _ = writeln!(out, "Winner: {}", report.winner_label());
    let _ = writeln!(out);
    for army in &report.armies {
        let _ = writeln!(out, "Army: {}", army.name);
        let _ = writeln!(out, "  Total Kills: {}", floor(army.total_kills));
        let _ = writeln!(out, "  Total Injured: {}", floor(army.total_injured));
        let _ = writeln!(out, "  Survivors: {}", floor(army.survivors));
        for troop in &army.troops {
            let _ = writeln!(out, "  {}:", troop.troop);
            let _ = writeln!(out, "    Kills: {}", floor(troop.kills));
            let _ = writeln!(out, "    Starting Count: {}", floor(troop.starting_count));
            let _ = writeln!(out, "    Remaining: {}", floor(troop.remaining));
            let _ = writeln!(out, "    Lightly Injured: {}", floor(troop.lightly_injured));
            let _ = writeln!(out, "    Severely Injured: {}", floor(troop.severely_injured));
        }
        let _ = writeln!(out, "  Skills Activated:");
        for (skill, count) in &army.skills_activated {
            let _ = writeln!(out, "    {skill}: {count} times");
        }
        let _ = writeln!(out);
    }
    out
}

fn floor(value: f64) -> u64 {
    value.max(0.0).floor() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::skills::{Skill, SkillEffect};
    use crate::combat::stats::BaseStats;
    use crate::combat::troop::Position;

    fn armies() -> [Army; 2] {
        let base = BaseStats {
            attack: 10.0,
            defense: 1.0,
            lethality: 0.0,
            health: 10.0,
        };
        let dave = Army::new(
            "Dave",
            vec![TroopGroup::new(TroopKind::Infantry, base, 120.7, Position::Front)],
            vec![Skill::new("Vigor Tactics", SkillEffect::DamageIncrease(15.0), 1.0)
                .once_per_battle()],
        )
        .expect("valid army");
        let brabo = Army::new(
            "Brabo",
            vec![TroopGroup::new(TroopKind::Lancer, base, 80.0, Position::Front)],
            Vec::new(),
        )
        .expect("valid army");
        [dave, brabo]
    }

    #[test]
    fn summary_totals_and_winner_label() {
        let report = BattleReport::new(
            4,
            Some(BattleOutcome::TurnLimitReached(Side::Defender)),
            &armies(),
        );
        let dave = report.army(Side::Attacker).expect("attacker summary");
        assert_eq!(dave.name, "Dave");
        assert_eq!(dave.survivors, 120.7);
        assert_eq!(dave.skills_activated.get("Vigor Tactics"), Some(&1));
        assert_eq!(report.winner_label(), "Brabo (turn limit reached)");

        let draw = BattleReport::new(4, Some(BattleOutcome::Draw), &armies());
        assert_eq!(draw.winner_label(), "Draw");
        let running = BattleReport::new(0, None, &armies());
        assert_eq!(running.winner_label(), "Undecided");
    }

    #[test]
    fn text_report_floors_counts() {
        let report = BattleReport::new(2, Some(BattleOutcome::Victory(Side::Attacker)), &armies());
        let text = render_text(&report);
        assert!(text.contains("Total Turns: 2"));
        assert!(text.contains("Winner: Dave\n"));
        assert!(text.contains("  Survivors: 120\n"));
        assert!(text.contains("    Starting Count: 120\n"));
        assert!(text.contains("    Vigor Tactics: 1 times\n"));
        assert!(text.contains("Army: Brabo"));
    }
}
