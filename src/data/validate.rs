//! Collect-all scenario validation: every problem is reported, not just the first.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::combat::{BattlePhase, EffectType, SkillTarget, Stat, TroopKind};
use crate::data::scenario::{load_scenario, ArmyConfig, ScenarioFile, SkillConfig, TroopConfig};
use crate::error::ScenarioError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    /// Location such as `attacker.troops[1].rng_skills[0]`.
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

pub fn validate_scenario(scenario: &ScenarioFile) -> ValidationReport {
    let mut report = ValidationReport::default();
    if scenario.max_turns == 0 {
        report.push(
            ValidationSeverity::Warning,
            "max_turns",
            "turn cap of 0 ends the battle before any action",
        );
    }
    if let Some(variance) = scenario.variance {
        if !variance.low.is_finite() || !variance.high.is_finite() || variance.low > variance.high {
            report.push(
                ValidationSeverity::Error,
                "variance",
                format!("invalid range {}..{}", variance.low, variance.high),
            );
        } else if variance.low < 0.0 {
            report.push(
                ValidationSeverity::Warning,
                "variance",
                "negative multiplier can heal the target",
            );
        }
    }
    validate_army(&mut report, "attacker", &scenario.attacker);
    validate_army(&mut report, "defender", &scenario.defender);

    // Effective-health checks only make sense once the buffs fold in cleanly.
    if !report.has_errors() {
        if let Err(err) = scenario.build_armies() {
            report.push(ValidationSeverity::Error, "scenario", err.to_string());
        }
    }

    for diag in &report.diagnostics {
        if diag.severity == ValidationSeverity::Warning {
            tracing::warn!(context = %diag.context, message = %diag.message, "scenario warning");
        }
    }
    report
}

pub fn validate_scenario_file(path: impl AsRef<Path>) -> Result<ValidationReport, ScenarioError> {
    let scenario = load_scenario(path)?;
    Ok(validate_scenario(&scenario))
}

fn validate_army(report: &mut ValidationReport, side: &str, army: &ArmyConfig) {
    if army.name.trim().is_empty() {
        report.push(ValidationSeverity::Warning, side, "army has no name");
    }
    if army.troops.is_empty() {
        report.push(ValidationSeverity::Error, side, "army has no troops");
    }

    let mut seen = HashSet::new();
    for (index, troop) in army.troops.iter().enumerate() {
        let context = format!("{side}.troops[{index}]");
        match TroopKind::parse(&troop.troop_type) {
            Some(kind) => {
                if !seen.insert(kind) {
                    report.push(
                        ValidationSeverity::Error,
                        &context,
                        format!("troop type {kind} appears more than once"),
                    );
                }
            }
            None => report.push(
                ValidationSeverity::Error,
                &context,
                format!("unknown troop type '{}'", troop.troop_type),
            ),
        }
        validate_troop(report, &context, troop);
    }

    for (index, skill) in army.hero_skills.iter().enumerate() {
        validate_skill(
            report,
            &format!("{side}.hero_skills[{index}]"),
            skill,
            SkillSlot::Hero,
        );
    }
}

fn validate_troop(report: &mut ValidationReport, context: &str, troop: &TroopConfig) {
    let base = troop.base_stats();
    for stat in Stat::ALL {
        let value = base.get(stat);
        if !value.is_finite() || value < 0.0 {
            report.push(
                ValidationSeverity::Error,
                context,
                format!("{} must be a non-negative number, got {value}", stat.as_str()),
            );
        }
        let bonus = troop.bonuses.get(stat);
        if !bonus.is_finite() {
            report.push(
                ValidationSeverity::Error,
                context,
                format!("{} bonus must be finite, got {bonus}", stat.as_str()),
            );
        }
    }
    if troop.health == 0.0 {
        report.push(ValidationSeverity::Error, context, "health must be positive");
    }
    if !troop.count.is_finite() || troop.count < 0.0 {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("count must be a non-negative number, got {}", troop.count),
        );
    } else if troop.count == 0.0 {
        report.push(
            ValidationSeverity::Info,
            context,
            "group starts defeated with a count of 0",
        );
    }
    if let Some(rate) = troop.engagement_rate {
        if !rate.is_finite() || rate <= 0.0 {
            report.push(
                ValidationSeverity::Error,
                context,
                format!("engagement rate must be positive, got {rate}"),
            );
        }
    }

    for (index, skill) in troop.static_skills.iter().enumerate() {
        validate_skill(
            report,
            &format!("{context}.static_skills[{index}]"),
            skill,
            SkillSlot::Static,
        );
    }
    for (index, skill) in troop.rng_skills.iter().enumerate() {
        validate_skill(
            report,
            &format!("{context}.rng_skills[{index}]"),
            skill,
            SkillSlot::Rolled,
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkillSlot {
    Static,
    Rolled,
    Hero,
}

fn validate_skill(
    report: &mut ValidationReport,
    context: &str,
    skill: &SkillConfig,
    slot: SkillSlot,
) {
    if !skill.chance.is_finite() || !(0.0..=1.0).contains(&skill.chance) {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("'{}' chance must be within [0, 1], got {}", skill.name, skill.chance),
        );
    } else if skill.chance == 0.0 && slot != SkillSlot::Static {
        report.push(
            ValidationSeverity::Warning,
            context,
            format!("'{}' has chance 0 and will almost never fire", skill.name),
        );
    }
    if !skill.value.is_finite() {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("'{}' value must be finite, got {}", skill.name, skill.value),
        );
    }

    let target = SkillTarget::parse(&skill.target);
    if target.is_none() {
        report.push(
            ValidationSeverity::Error,
            context,
            format!("'{}' targets unknown troop type '{}'", skill.name, skill.target),
        );
    }

    if skill.max_uses == Some(0) {
        report.push(
            ValidationSeverity::Warning,
            context,
            format!("'{}' has max_uses 0 and can never fire", skill.name),
        );
    }
    if skill.phase != BattlePhase::Any {
        report.push(
            ValidationSeverity::Info,
            context,
            format!("'{}' phase is not used by the resolver", skill.name),
        );
    }

    match slot {
        SkillSlot::Static if skill.effect_type != EffectType::DamageIncrease => report.push(
            ValidationSeverity::Warning,
            context,
            format!(
                "static skill '{}' is {} and will be ignored; only damage_increase applies",
                skill.name, skill.effect_type
            ),
        ),
        SkillSlot::Hero if skill.once_per_battle && !grants_starting_bonus(skill.effect_type) => {
            report.push(
                ValidationSeverity::Warning,
                context,
                format!(
                    "once-per-battle '{}' is {} and only counts as an activation",
                    skill.name, skill.effect_type
                ),
            )
        }
        _ => {}
    }

    let rolled = slot == SkillSlot::Rolled || (slot == SkillSlot::Hero && !skill.once_per_battle);
    if rolled {
        match skill.effect_type {
            EffectType::DefenseIncrease | EffectType::HealthIncrease => report.push(
                ValidationSeverity::Warning,
                context,
                format!(
                    "'{}' is {} rolled per turn and has no effect outside once_per_battle",
                    skill.name, skill.effect_type
                ),
            ),
            EffectType::DirectAttack if target == Some(SkillTarget::All) => report.push(
                ValidationSeverity::Warning,
                context,
                format!("direct attack '{}' needs a troop type target", skill.name),
            ),
            _ => {}
        }
    }
}

fn grants_starting_bonus(effect_type: EffectType) -> bool {
    matches!(
        effect_type,
        EffectType::DamageIncrease | EffectType::DefenseIncrease | EffectType::HealthIncrease
    )
}
