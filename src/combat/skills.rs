use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::rng::RandomSource;
use crate::combat::stats::Stat;
use crate::combat::troop::TroopKind;

/// Effect families as they appear in scenario files and event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    DamageIncrease,
    DefenseIncrease,
    HealthIncrease,
    Stun,
    Burn,
    DamageTakenIncrease,
    DamageDecrease,
    DirectAttack,
    MultiAttack,
}

impl EffectType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DamageIncrease => "damage_increase",
            Self::DefenseIncrease => "defense_increase",
            Self::HealthIncrease => "health_increase",
            Self::Stun => "stun",
            Self::Burn => "burn",
            Self::DamageTakenIncrease => "damage_taken_increase",
            Self::DamageDecrease => "damage_decrease",
            Self::DirectAttack => "direct_attack",
            Self::MultiAttack => "multi_attack",
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a skill does when it fires. Percentages are carried as given (`50.0` is 50%).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillEffect {
    DamageIncrease(f64),
    DefenseIncrease(f64),
    HealthIncrease(f64),
    Stun,
    /// Burn magnitude as a percentage of the triggering hit.
    Burn(f64),
    DamageTakenIncrease(f64),
    DamageDecrease(f64),
    DirectAttack,
    MultiAttack,
}

impl SkillEffect {
    pub fn from_parts(effect_type: EffectType, value: f64) -> Self {
        match effect_type {
            EffectType::DamageIncrease => Self::DamageIncrease(value),
            EffectType::DefenseIncrease => Self::DefenseIncrease(value),
            EffectType::HealthIncrease => Self::HealthIncrease(value),
            EffectType::Stun => Self::Stun,
            EffectType::Burn => Self::Burn(value),
            EffectType::DamageTakenIncrease => Self::DamageTakenIncrease(value),
            EffectType::DamageDecrease => Self::DamageDecrease(value),
            EffectType::DirectAttack => Self::DirectAttack,
            EffectType::MultiAttack => Self::MultiAttack,
        }
    }

    pub const fn effect_type(self) -> EffectType {
        match self {
            Self::DamageIncrease(_) => EffectType::DamageIncrease,
            Self::DefenseIncrease(_) => EffectType::DefenseIncrease,
            Self::HealthIncrease(_) => EffectType::HealthIncrease,
            Self::Stun => EffectType::Stun,
            Self::Burn(_) => EffectType::Burn,
            Self::DamageTakenIncrease(_) => EffectType::DamageTakenIncrease,
            Self::DamageDecrease(_) => EffectType::DamageDecrease,
            Self::DirectAttack => EffectType::DirectAttack,
            Self::MultiAttack => EffectType::MultiAttack,
        }
    }

    /// Permanent stat bonus folded in at battle start for once-per-battle hero skills.
    /// A damage increase lands on attack.
    pub const fn starting_bonus(self) -> Option<(Stat, f64)> {
        match self {
            Self::DamageIncrease(value) => Some((Stat::Attack, value)),
            Self::DefenseIncrease(value) => Some((Stat::Defense, value)),
            Self::HealthIncrease(value) => Some((Stat::Health, value)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkillTarget {
    #[default]
    All,
    Troop(TroopKind),
}

impl SkillTarget {
    pub fn matches(self, kind: TroopKind) -> bool {
        match self {
            Self::All => true,
            Self::Troop(target) => target == kind,
        }
    }

    /// Parses `"All"` or a troop type name, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        TroopKind::parse(raw).map(Self::Troop)
    }
}

impl fmt::Display for SkillTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Troop(kind) => write!(f, "{kind}"),
        }
    }
}

/// Reserved for phase-gated skills; the resolver does not consult it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    Start,
    Middle,
    End,
    #[default]
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub name: String,
    pub effect: SkillEffect,
    /// Activation probability in [0, 1].
    pub chance: f64,
    pub target: SkillTarget,
    /// Turns the resulting status effect lasts.
    pub duration: u32,
    pub once_per_battle: bool,
    /// `None` means unlimited.
    pub max_uses: Option<u32>,
    pub phase: BattlePhase,
    activation_count: u32,
    kills: f64,
}

impl Skill {
    pub fn new(name: impl Into<String>, effect: SkillEffect, chance: f64) -> Self {
        Self {
            name: name.into(),
            effect,
            chance,
            target: SkillTarget::All,
            duration: 1,
            once_per_battle: false,
            max_uses: None,
            phase: BattlePhase::Any,
            activation_count: 0,
            kills: 0.0,
        }
    }

    pub fn with_target(mut self, target: SkillTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_duration(mut self, duration: u32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    pub fn with_phase(mut self, phase: BattlePhase) -> Self {
        self.phase = phase;
        self
    }

    pub fn once_per_battle(mut self) -> Self {
        self.once_per_battle = true;
        self
    }

    pub fn activation_count(&self) -> u32 {
        self.activation_count
    }

    pub fn kills(&self) -> f64 {
        self.kills
    }

    /// True once the skill can no longer fire this battle.
    pub fn is_exhausted(&self) -> bool {
        (self.once_per_battle && self.activation_count > 0)
            || self
                .max_uses
                .is_some_and(|max| self.activation_count >= max)
    }

    /// Roll for activation. Exhausted skills never draw; a successful roll bumps the counter.
    pub fn try_activate<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_exhausted() {
            return false;
        }
        let activated = rng.next_f64() <= self.chance.min(1.0);
        if activated {
            self.activation_count += 1;
        }
        activated
    }

    /// Counts an activation without rolling (starting buffs).
    pub(crate) fn record_activation(&mut self) {
        self.activation_count += 1;
    }

    pub(crate) fn credit_kills(&mut self, troops: f64) {
        self.kills += troops;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::{FixedRoll, Rng};

    #[test]
    fn certain_skill_fires_and_counts() {
        let mut skill = Skill::new("Charge", SkillEffect::DamageIncrease(10.0), 1.0);
        let mut rng = Rng::new(1);
        for _ in 0..5 {
            assert!(skill.try_activate(&mut rng));
        }
        assert_eq!(skill.activation_count(), 5);
    }

    #[test]
    fn roll_equal_to_chance_fires() {
        let mut skill = Skill::new("Volley", SkillEffect::MultiAttack, 0.1);
        assert!(skill.try_activate(&mut FixedRoll(0.1)));
        assert!(!skill.try_activate(&mut FixedRoll(0.1000001)));
        assert_eq!(skill.activation_count(), 1);
    }

    #[test]
    fn chance_above_one_is_clamped() {
        let mut skill = Skill::new("Sure", SkillEffect::Stun, 3.0);
        assert!(skill.try_activate(&mut FixedRoll(0.999)));
    }

    #[test]
    fn once_per_battle_fires_at_most_once() {
        let mut skill = Skill::new("Resolve", SkillEffect::Stun, 1.0).once_per_battle();
        let mut rng = Rng::new(9);
        assert!(skill.try_activate(&mut rng));
        for _ in 0..10 {
            assert!(!skill.try_activate(&mut rng));
        }
        assert_eq!(skill.activation_count(), 1);
        assert!(skill.is_exhausted());
    }

    #[test]
    fn max_uses_caps_activations() {
        let mut skill =
            Skill::new("Dosage Boost", SkillEffect::DamageIncrease(200.0), 1.0).with_max_uses(2);
        let mut rng = Rng::new(4);
        let fired = (0..6).filter(|_| skill.try_activate(&mut rng)).count();
        assert_eq!(fired, 2);
        assert_eq!(skill.activation_count(), 2);
    }

    #[test]
    fn failed_roll_has_no_side_effect() {
        let mut skill = Skill::new("Spores", SkillEffect::Stun, 0.2);
        assert!(!skill.try_activate(&mut FixedRoll(0.5)));
        assert_eq!(skill.activation_count(), 0);
    }

    #[test]
    fn target_parsing_and_matching() {
        assert_eq!(SkillTarget::parse("All"), Some(SkillTarget::All));
        assert_eq!(
            SkillTarget::parse("marksman"),
            Some(SkillTarget::Troop(TroopKind::Marksman))
        );
        assert_eq!(SkillTarget::parse("Cavalry"), None);
        assert!(SkillTarget::All.matches(TroopKind::Lancer));
        assert!(!SkillTarget::Troop(TroopKind::Infantry).matches(TroopKind::Lancer));
    }

    #[test]
    fn starting_bonus_maps_damage_increase_to_attack() {
        assert_eq!(
            SkillEffect::DamageIncrease(25.0).starting_bonus(),
            Some((Stat::Attack, 25.0))
        );
        assert_eq!(
            SkillEffect::HealthIncrease(10.0).starting_bonus(),
            Some((Stat::Health, 10.0))
        );
        assert_eq!(SkillEffect::Burn(40.0).starting_bonus(), None);
    }
}
