pub mod army;
pub mod damage;
pub mod engine;
pub mod events;
pub mod export_csv;
pub mod report;
pub mod rng;
pub mod skills;
pub mod stats;
pub mod status;
pub mod troop;

pub use army::{Army, FiredSkill, SkillRef};
pub use damage::{
    apply_damage, compute_damage, widened_defense, Casualties, DamageRoll, DamageVariance,
    LIGHTLY_INJURED_RATIO, SEVERELY_INJURED_RATIO,
};
pub use engine::{
    simulate_battle, Battle, BattleEvents, BattleOutcome, BattleState, Side, SimulationConfig,
    SimulationResult, DEFAULT_MAX_TURNS, DEFAULT_WINNER_ON_TIMEOUT,
};
pub use events::{serialize_events_json, BattleEvent, TraceCollector, TraceMode};
pub use export_csv::{write_events_csv, EventRow};
pub use report::{render_text, ArmySummary, BattleReport, TroopSummary};
pub use rng::{entropy_seed, FixedRoll, RandomSource, Rng};
pub use skills::{BattlePhase, EffectType, Skill, SkillEffect, SkillTarget};
pub use stats::{resolve_effective_stats, BaseStats, EffectiveStats, Stat, StatBonuses};
pub use status::{StatusEffect, StatusKind, StatusLedger};
pub use troop::{Position, TroopGroup, TroopKind};
