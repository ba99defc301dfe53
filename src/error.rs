use std::path::PathBuf;

use thiserror::Error;

/// Misconfiguration caught while building armies, before any turn is simulated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("army '{army}': unknown troop type '{name}'")]
    UnknownTroopType { army: String, name: String },

    #[error("army '{army}': skill '{skill}' targets unknown troop type '{target}'")]
    InvalidSkillTarget {
        army: String,
        skill: String,
        target: String,
    },

    #[error("army '{army}': skill '{skill}' has chance {chance}, expected a value in [0, 1]")]
    InvalidProbability {
        army: String,
        skill: String,
        chance: f64,
    },

    #[error("army '{army}': skill '{skill}' has non-finite value {value}")]
    InvalidSkillValue {
        army: String,
        skill: String,
        value: f64,
    },

    #[error("army '{army}': {troop} has invalid {stat} {value}")]
    InvalidStat {
        army: String,
        troop: String,
        stat: &'static str,
        value: f64,
    },

    #[error("army '{army}': {troop} has invalid engagement rate {rate}")]
    InvalidEngagementRate {
        army: String,
        troop: String,
        rate: f64,
    },

    #[error("army '{army}': troop type {troop} appears more than once")]
    DuplicateTroop { army: String, troop: String },

    #[error("army '{army}' has no troops")]
    EmptyArmy { army: String },
}

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("unable to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid scenario json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A run that hit an arithmetic defect. Never expected for validated armies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BattleError {
    #[error("turn {turn}: {army}'s {actor} produced non-finite damage {damage}")]
    NonFiniteDamage {
        turn: u32,
        army: String,
        actor: String,
        damage: f64,
    },
}
