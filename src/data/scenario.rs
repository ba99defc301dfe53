//! Two-army scenario files (YAML or JSON) and their conversion into runtime armies.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::combat::{
    Army, BaseStats, BattlePhase, DamageVariance, EffectType, Position, SimulationConfig, Skill,
    SkillEffect, SkillTarget, StatBonuses, TraceMode, TroopGroup, TroopKind, DEFAULT_MAX_TURNS,
};
use crate::error::{ConfigError, ScenarioError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
    /// Base seed; a fresh entropy seed is drawn when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variance: Option<DamageVariance>,
    pub attacker: ArmyConfig,
    pub defender: ArmyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyConfig {
    pub name: String,
    #[serde(default)]
    pub hero_skills: Vec<SkillConfig>,
    pub troops: Vec<TroopConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TroopConfig {
    /// Kept as text so an unknown type surfaces as a configuration error naming the army.
    pub troop_type: String,
    pub attack: f64,
    pub defense: f64,
    pub lethality: f64,
    pub health: f64,
    pub count: f64,
    #[serde(default)]
    pub bonuses: StatBonuses,
    #[serde(default)]
    pub static_skills: Vec<SkillConfig>,
    #[serde(default)]
    pub rng_skills: Vec<SkillConfig>,
    pub position: Position,
    #[serde(default = "default_initiative")]
    pub initiative: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillConfig {
    pub name: String,
    pub effect_type: EffectType,
    #[serde(default)]
    pub value: f64,
    pub chance: f64,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default)]
    pub once_per_battle: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub phase: BattlePhase,
}

fn default_max_turns() -> u32 {
    DEFAULT_MAX_TURNS
}

fn default_initiative() -> i32 {
    1
}

fn default_target() -> String {
    "All".to_string()
}

fn default_duration() -> u32 {
    1
}

impl ScenarioFile {
    pub fn simulation_config(&self, trace_mode: TraceMode) -> SimulationConfig {
        SimulationConfig {
            max_turns: self.max_turns,
            variance: self.variance.unwrap_or_default(),
            trace_mode,
        }
    }

    /// Builds `(attacker, defender)`, applying once-per-battle buffs.
    pub fn build_armies(&self) -> Result<(Army, Army), ConfigError> {
        Ok((self.attacker.build()?, self.defender.build()?))
    }

    pub fn to_yaml(&self) -> Result<String, ScenarioError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl ArmyConfig {
    pub fn build(&self) -> Result<Army, ConfigError> {
        let troops = self
            .troops
            .iter()
            .map(|troop| troop.build(&self.name))
            .collect::<Result<Vec<_>, _>>()?;
        let hero_skills = self
            .hero_skills
            .iter()
            .map(|skill| skill.build(&self.name))
            .collect::<Result<Vec<_>, _>>()?;
        Army::new(self.name.clone(), troops, hero_skills)
    }
}

impl TroopConfig {
    pub fn kind(&self, army: &str) -> Result<TroopKind, ConfigError> {
        TroopKind::parse(&self.troop_type).ok_or_else(|| ConfigError::UnknownTroopType {
            army: army.to_string(),
            name: self.troop_type.clone(),
        })
    }

    pub fn base_stats(&self) -> BaseStats {
        BaseStats {
            attack: self.attack,
            defense: self.defense,
            lethality: self.lethality,
            health: self.health,
        }
    }

    pub fn build(&self, army: &str) -> Result<TroopGroup, ConfigError> {
        let kind = self.kind(army)?;
        let mut troop = TroopGroup::new(kind, self.base_stats(), self.count, self.position)
            .with_bonuses(self.bonuses)
            .with_initiative(self.initiative);
        if let Some(rate) = self.engagement_rate {
            troop = troop.with_engagement_rate(rate);
        }
        for skill in &self.static_skills {
            troop = troop.with_static_skill(skill.build(army)?);
        }
        for skill in &self.rng_skills {
            troop = troop.with_rng_skill(skill.build(army)?);
        }
        Ok(troop)
    }
}

impl SkillConfig {
    pub fn target(&self, army: &str) -> Result<SkillTarget, ConfigError> {
        SkillTarget::parse(&self.target).ok_or_else(|| ConfigError::InvalidSkillTarget {
            army: army.to_string(),
            skill: self.name.clone(),
            target: self.target.clone(),
        })
    }

    pub fn build(&self, army: &str) -> Result<Skill, ConfigError> {
        let mut skill = Skill::new(
            self.name.clone(),
            SkillEffect::from_parts(self.effect_type, self.value),
            self.chance,
        )
        .with_target(self.target(army)?)
        .with_duration(self.duration)
        .with_phase(self.phase);
        if let Some(max_uses) = self.max_uses {
            skill = skill.with_max_uses(max_uses);
        }
        if self.once_per_battle {
            skill = skill.once_per_battle();
        }
        Ok(skill)
    }
}

pub fn parse_scenario_yaml(raw: &str) -> Result<ScenarioFile, ScenarioError> {
    Ok(serde_yaml::from_str(raw)?)
}

pub fn parse_scenario_json(raw: &str) -> Result<ScenarioFile, ScenarioError> {
    Ok(serde_json::from_str(raw)?)
}

/// Loads a scenario, picking the format from the extension (`.json` is JSON, anything else YAML).
pub fn load_scenario(path: impl AsRef<Path>) -> Result<ScenarioFile, ScenarioError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let scenario = if is_json {
        parse_scenario_json(&raw)?
    } else {
        parse_scenario_yaml(&raw)?
    };
    tracing::info!(
        path = %path.display(),
        attacker = %scenario.attacker.name,
        defender = %scenario.defender.name,
        max_turns = scenario.max_turns,
        "scenario loaded"
    );
    Ok(scenario)
}
