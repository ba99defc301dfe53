pub mod presets;
pub mod scenario;
pub mod validate;

pub use presets::{sample_scenario, SAMPLE_SCENARIO_PATH};
pub use scenario::{
    load_scenario, parse_scenario_json, parse_scenario_yaml, ArmyConfig, ScenarioFile,
    SkillConfig, TroopConfig,
};
pub use validate::{
    validate_scenario, validate_scenario_file, ValidationDiagnostic, ValidationReport,
    ValidationSeverity,
};
