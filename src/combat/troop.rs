use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::skills::Skill;
use crate::combat::stats::{resolve_effective_stats, BaseStats, EffectiveStats, Stat, StatBonuses};
use crate::combat::status::StatusLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TroopKind {
    Infantry,
    Lancer,
    Marksman,
}

impl TroopKind {
    pub const ALL: [TroopKind; 3] = [TroopKind::Infantry, TroopKind::Lancer, TroopKind::Marksman];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Infantry => "Infantry",
            Self::Lancer => "Lancer",
            Self::Marksman => "Marksman",
        }
    }

    /// Multiple of the group's count that physically engages per clash.
    pub const fn engagement_rate(self) -> f64 {
        match self {
            Self::Infantry => 3.0,
            Self::Lancer => 1.0,
            Self::Marksman => 1.0,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for TroopKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Targeting tier. Attackers strike the first tier (Front, then Middle, then Back) that still
/// has a living group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Front,
    Middle,
    Back,
}

impl Position {
    pub const PRIORITY: [Position; 3] = [Position::Front, Position::Middle, Position::Back];
}

#[derive(Debug, Clone, PartialEq)]
pub struct TroopGroup {
    pub kind: TroopKind,
    pub position: Position,
    /// Turn-order key, higher acts first.
    pub initiative: i32,
    pub engagement_rate: f64,
    /// Always-on damage bonuses.
    pub static_skills: Vec<Skill>,
    /// Skills rolled every time the group acts.
    pub rng_skills: Vec<Skill>,
    base: BaseStats,
    bonuses: StatBonuses,
    stats: EffectiveStats,
    count: f64,
    initial_count: f64,
    alive: bool,
    kills: f64,
    lightly_injured: f64,
    severely_injured: f64,
    status: StatusLedger,
}

impl TroopGroup {
    pub fn new(kind: TroopKind, base: BaseStats, count: f64, position: Position) -> Self {
        let bonuses = StatBonuses::default();
        Self {
            kind,
            position,
            initiative: 1,
            engagement_rate: kind.engagement_rate(),
            static_skills: Vec::new(),
            rng_skills: Vec::new(),
            base,
            bonuses,
            stats: resolve_effective_stats(&base, &bonuses),
            count,
            initial_count: count,
            alive: count > 0.0,
            kills: 0.0,
            lightly_injured: 0.0,
            severely_injured: 0.0,
            status: StatusLedger::new(),
        }
    }

    pub fn with_bonuses(mut self, bonuses: StatBonuses) -> Self {
        self.bonuses = bonuses;
        self.stats = resolve_effective_stats(&self.base, &self.bonuses);
        self
    }

    pub fn with_initiative(mut self, initiative: i32) -> Self {
        self.initiative = initiative;
        self
    }

    pub fn with_engagement_rate(mut self, rate: f64) -> Self {
        self.engagement_rate = rate;
        self
    }

    pub fn with_static_skill(mut self, skill: Skill) -> Self {
        self.static_skills.push(skill);
        self
    }

    pub fn with_rng_skill(mut self, skill: Skill) -> Self {
        self.rng_skills.push(skill);
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn base(&self) -> &BaseStats {
        &self.base
    }

    pub fn bonuses(&self) -> &StatBonuses {
        &self.bonuses
    }

    pub fn stats(&self) -> &EffectiveStats {
        &self.stats
    }

    pub fn count(&self) -> f64 {
        self.count
    }

    pub fn initial_count(&self) -> f64 {
        self.initial_count
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kills(&self) -> f64 {
        self.kills
    }

    pub fn lightly_injured(&self) -> f64 {
        self.lightly_injured
    }

    pub fn severely_injured(&self) -> f64 {
        self.severely_injured
    }

    /// Remaining hit points, derived from the count so the two can never drift apart.
    pub fn total_health(&self) -> f64 {
        self.count * self.stats.health
    }

    pub fn status(&self) -> &StatusLedger {
        &self.status
    }

    pub(crate) fn status_mut(&mut self) -> &mut StatusLedger {
        &mut self.status
    }

    /// Troops physically engaged in one clash; at least one.
    pub fn engaged_troops(&self) -> u64 {
        ((self.count * self.engagement_rate).floor() as u64).max(1)
    }

    /// Folds a permanent percentage bonus in and re-resolves effective stats.
    pub(crate) fn apply_bonus(&mut self, stat: Stat, percent: f64) {
        self.bonuses.add(stat, percent);
        self.stats = resolve_effective_stats(&self.base, &self.bonuses);
    }

    /// Removes up to `troops` from the group, books injuries and updates `alive`.
    /// Returns the number actually removed.
    pub(crate) fn remove_troops(&mut self, troops: f64, lightly_ratio: f64) -> f64 {
        let lost = troops.min(self.count).max(0.0);
        self.count = (self.count - lost).max(0.0);
        if lost > 0.0 {
            self.lightly_injured += lost * lightly_ratio;
            self.severely_injured += lost * (1.0 - lightly_ratio);
        }
        self.alive = self.count > 0.0;
        lost
    }

    pub(crate) fn credit_kills(&mut self, troops: f64) {
        self.kills += troops;
    }
}
