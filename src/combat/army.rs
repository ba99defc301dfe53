use std::collections::BTreeMap;

use crate::combat::rng::RandomSource;
use crate::combat::skills::{Skill, SkillEffect, SkillTarget};
use crate::combat::stats::Stat;
use crate::combat::status::StatusLedger;
use crate::combat::troop::{Position, TroopGroup, TroopKind};
use crate::error::ConfigError;

/// Where a fired skill lives, so kills can be credited back to it after the hit lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillRef {
    Troop { troop: usize, skill: usize },
    Hero(usize),
}

/// A skill that fired for the current actor, detached from the army so it can be applied
/// against the opposing side.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredSkill {
    pub source: SkillRef,
    pub name: String,
    pub effect: SkillEffect,
    pub target: SkillTarget,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Army {
    pub name: String,
    troops: Vec<TroopGroup>,
    hero_skills: Vec<Skill>,
    status: StatusLedger,
    skill_activations: BTreeMap<String, u32>,
}

impl Army {
    /// Validates the composition and applies once-per-battle hero buffs.
    pub fn new(
        name: impl Into<String>,
        troops: Vec<TroopGroup>,
        hero_skills: Vec<Skill>,
    ) -> Result<Self, ConfigError> {
        let mut army = Self {
            name: name.into(),
            troops,
            hero_skills,
            status: StatusLedger::new(),
            skill_activations: BTreeMap::new(),
        };
        army.validate()?;
        army.apply_starting_buffs();
        army.validate_effective_health()?;
        Ok(army)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.troops.is_empty() {
            return Err(ConfigError::EmptyArmy {
                army: self.name.clone(),
            });
        }
        for (index, troop) in self.troops.iter().enumerate() {
            if self.troops[..index].iter().any(|t| t.kind == troop.kind) {
                return Err(ConfigError::DuplicateTroop {
                    army: self.name.clone(),
                    troop: troop.name().to_string(),
                });
            }
            self.validate_troop(troop)?;
        }
        for skill in &self.hero_skills {
            self.validate_skill(skill)?;
        }
        Ok(())
    }

    fn validate_troop(&self, troop: &TroopGroup) -> Result<(), ConfigError> {
        let invalid = |stat: &'static str, value: f64| ConfigError::InvalidStat {
            army: self.name.clone(),
            troop: troop.name().to_string(),
            stat,
            value,
        };
        for stat in Stat::ALL {
            let value = troop.base().get(stat);
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(stat.as_str(), value));
            }
            let bonus = troop.bonuses().get(stat);
            if !bonus.is_finite() {
                return Err(invalid(stat.as_str(), bonus));
            }
        }
        let count = troop.count();
        if !count.is_finite() || count < 0.0 {
            return Err(invalid("count", count));
        }
        if !troop.engagement_rate.is_finite() || troop.engagement_rate <= 0.0 {
            return Err(ConfigError::InvalidEngagementRate {
                army: self.name.clone(),
                troop: troop.name().to_string(),
                rate: troop.engagement_rate,
            });
        }
        troop
            .static_skills
            .iter()
            .chain(&troop.rng_skills)
            .try_for_each(|skill| self.validate_skill(skill))
    }

    fn validate_skill(&self, skill: &Skill) -> Result<(), ConfigError> {
        if !skill.chance.is_finite() || !(0.0..=1.0).contains(&skill.chance) {
            return Err(ConfigError::InvalidProbability {
                army: self.name.clone(),
                skill: skill.name.clone(),
                chance: skill.chance,
            });
        }
        let value = match skill.effect {
            SkillEffect::DamageIncrease(v)
            | SkillEffect::DefenseIncrease(v)
            | SkillEffect::HealthIncrease(v)
            | SkillEffect::Burn(v)
            | SkillEffect::DamageTakenIncrease(v)
            | SkillEffect::DamageDecrease(v) => v,
            SkillEffect::Stun | SkillEffect::DirectAttack | SkillEffect::MultiAttack => 0.0,
        };
        if !value.is_finite() {
            return Err(ConfigError::InvalidSkillValue {
                army: self.name.clone(),
                skill: skill.name.clone(),
                value,
            });
        }
        Ok(())
    }

    /// Casualties divide by effective health, so it must stay positive after buffs.
    fn validate_effective_health(&self) -> Result<(), ConfigError> {
        for troop in &self.troops {
            let health = troop.stats().health;
            if !health.is_finite() || health <= 0.0 {
                return Err(ConfigError::InvalidStat {
                    army: self.name.clone(),
                    troop: troop.name().to_string(),
                    stat: "effective health",
                    value: health,
                });
            }
        }
        Ok(())
    }

    /// One-time fold of once-per-battle hero skills into the bonuses of every matching troop.
    /// These skills are never rolled during turns.
    fn apply_starting_buffs(&mut self) {
        for skill in self.hero_skills.iter_mut().filter(|s| s.once_per_battle) {
            skill.record_activation();
            self.skill_activations.insert(skill.name.clone(), 1);
            let Some((stat, percent)) = skill.effect.starting_bonus() else {
                continue;
            };
            for troop in self
                .troops
                .iter_mut()
                .filter(|troop| skill.target.matches(troop.kind))
            {
                troop.apply_bonus(stat, percent);
            }
            tracing::trace!(
                army = %self.name,
                skill = %skill.name,
                stat = stat.as_str(),
                percent,
                "starting buff applied"
            );
        }
    }

    pub fn troops(&self) -> &[TroopGroup] {
        &self.troops
    }

    pub fn troop(&self, kind: TroopKind) -> Option<&TroopGroup> {
        self.troops.iter().find(|troop| troop.kind == kind)
    }

    pub fn troop_index(&self, kind: TroopKind) -> Option<usize> {
        self.troops.iter().position(|troop| troop.kind == kind)
    }

    pub(crate) fn troop_mut(&mut self, index: usize) -> &mut TroopGroup {
        &mut self.troops[index]
    }

    pub fn hero_skills(&self) -> &[Skill] {
        &self.hero_skills
    }

    pub fn status(&self) -> &StatusLedger {
        &self.status
    }

    pub(crate) fn status_mut(&mut self) -> &mut StatusLedger {
        &mut self.status
    }

    /// Skill name to number of activations this battle.
    pub fn skill_activations(&self) -> &BTreeMap<String, u32> {
        &self.skill_activations
    }

    pub fn is_defeated(&self) -> bool {
        self.troops.iter().all(|troop| !troop.is_alive())
    }

    pub fn total_health(&self) -> f64 {
        self.troops
            .iter()
            .filter(|troop| troop.is_alive())
            .map(TroopGroup::total_health)
            .sum()
    }

    /// Indices of living groups in the first non-empty position tier, in army order.
    pub fn frontline(&self) -> Vec<usize> {
        for position in Position::PRIORITY {
            let tier: Vec<usize> = self
                .troops
                .iter()
                .enumerate()
                .filter(|(_, troop)| troop.position == position && troop.is_alive())
                .map(|(index, _)| index)
                .collect();
            if !tier.is_empty() {
                return tier;
            }
        }
        Vec::new()
    }

    /// Rolls every rng skill of the acting group, then every turn-rolled hero skill, once each
    /// and in order. Returns the ones that fired.
    pub(crate) fn roll_skills<R: RandomSource + ?Sized>(
        &mut self,
        actor: usize,
        rng: &mut R,
    ) -> Vec<FiredSkill> {
        let mut fired = Vec::new();
        let troop_skills = self.troops[actor]
            .rng_skills
            .iter_mut()
            .enumerate()
            .map(|(skill, s)| (SkillRef::Troop { troop: actor, skill }, s));
        let hero_skills = self
            .hero_skills
            .iter_mut()
            .enumerate()
            .filter(|(_, s)| !s.once_per_battle)
            .map(|(index, s)| (SkillRef::Hero(index), s));
        for (source, skill) in troop_skills.chain(hero_skills) {
            if skill.try_activate(rng) {
                *self.skill_activations.entry(skill.name.clone()).or_insert(0) += 1;
                fired.push(FiredSkill {
                    source,
                    name: skill.name.clone(),
                    effect: skill.effect,
                    target: skill.target,
                    duration: skill.duration,
                });
            }
        }
        fired
    }

    pub(crate) fn credit_skill_kills(&mut self, source: SkillRef, troops: f64) {
        let skill = match source {
            SkillRef::Troop { troop, skill } => self.troops[troop].rng_skills.get_mut(skill),
            SkillRef::Hero(index) => self.hero_skills.get_mut(index),
        };
        if let Some(skill) = skill {
            skill.credit_kills(troops);
        }
    }
}
