//! Stat resolution: base stats composed with percentage bonuses.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Attack,
    Defense,
    Lethality,
    Health,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Attack, Stat::Defense, Stat::Lethality, Stat::Health];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::Lethality => "lethality",
            Self::Health => "health",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: f64,
    pub defense: f64,
    pub lethality: f64,
    pub health: f64,
}

impl BaseStats {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Lethality => self.lethality,
            Stat::Health => self.health,
        }
    }
}

/// Percentage bonuses per stat; `12.5` means +12.5%. Missing keys deserialize to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatBonuses {
    pub attack: f64,
    pub defense: f64,
    pub lethality: f64,
    pub health: f64,
}

impl StatBonuses {
    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Defense => self.defense,
            Stat::Lethality => self.lethality,
            Stat::Health => self.health,
        }
    }

    pub fn add(&mut self, stat: Stat, percent: f64) {
        let slot = match stat {
            Stat::Attack => &mut self.attack,
            Stat::Defense => &mut self.defense,
            Stat::Lethality => &mut self.lethality,
            Stat::Health => &mut self.health,
        };
        *slot += percent;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    pub attack: f64,
    pub defense: f64,
    pub lethality: f64,
    pub health: f64,
}

/// `base * (1 + percent / 100)`.
#[inline]
pub fn compose(base: f64, percent: f64) -> f64 {
    base * (1.0 + percent / 100.0)
}

/// Resolve each stat independently against its bonus.
pub fn resolve_effective_stats(base: &BaseStats, bonuses: &StatBonuses) -> EffectiveStats {
    EffectiveStats {
        attack: compose(base.attack, bonuses.attack),
        defense: compose(base.defense, bonuses.defense),
        lethality: compose(base.lethality, bonuses.lethality),
        health: compose(base.health, bonuses.health),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn zero_bonuses_leave_base_untouched() {
        let base = BaseStats {
            attack: 10.0,
            defense: 13.0,
            lethality: 10.0,
            health: 15.0,
        };
        let eff = resolve_effective_stats(&base, &StatBonuses::default());
        approx_eq(eff.attack, 10.0);
        approx_eq(eff.defense, 13.0);
        approx_eq(eff.lethality, 10.0);
        approx_eq(eff.health, 15.0);
    }

    #[test]
    fn bonuses_apply_per_stat() {
        let base = BaseStats {
            attack: 10.0,
            defense: 13.0,
            lethality: 10.0,
            health: 15.0,
        };
        let bonuses = StatBonuses {
            attack: 904.6,
            defense: 690.5,
            lethality: 0.0,
            health: -50.0,
        };
        let eff = resolve_effective_stats(&base, &bonuses);
        approx_eq(eff.attack, 100.46);
        approx_eq(eff.defense, 13.0 * 7.905);
        approx_eq(eff.lethality, 10.0);
        approx_eq(eff.health, 7.5);
    }

    #[test]
    fn add_accumulates_into_existing_bonus() {
        let mut bonuses = StatBonuses {
            attack: 10.0,
            ..StatBonuses::default()
        };
        bonuses.add(Stat::Attack, 25.0);
        bonuses.add(Stat::Health, 10.0);
        approx_eq(bonuses.get(Stat::Attack), 35.0);
        approx_eq(bonuses.get(Stat::Health), 10.0);
        approx_eq(bonuses.get(Stat::Defense), 0.0);
    }
}
