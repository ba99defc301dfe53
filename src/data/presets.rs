//! Built-in sample scenario: two late-game armies, Dave (attacker) against Brabo (defender).

use crate::combat::{BattlePhase, EffectType, Position, StatBonuses, DEFAULT_MAX_TURNS};
use crate::data::scenario::{ArmyConfig, ScenarioFile, SkillConfig, TroopConfig};

pub const SAMPLE_SCENARIO_PATH: &str = "data/scenarios/sample.yaml";

fn skill(
    name: &str,
    effect_type: EffectType,
    value: f64,
    chance: f64,
    target: &str,
) -> SkillConfig {
    SkillConfig {
        name: name.to_string(),
        effect_type,
        value,
        chance,
        target: target.to_string(),
        duration: 1,
        once_per_battle: false,
        max_uses: None,
        phase: BattlePhase::Any,
    }
}

fn opening_buff(name: &str, effect_type: EffectType, value: f64) -> SkillConfig {
    SkillConfig {
        once_per_battle: true,
        ..skill(name, effect_type, value, 1.0, "All")
    }
}

fn lasting(mut skill: SkillConfig, duration: u32) -> SkillConfig {
    skill.duration = duration;
    skill
}

fn bonuses(attack: f64, defense: f64, lethality: f64, health: f64) -> StatBonuses {
    StatBonuses {
        attack,
        defense,
        lethality,
        health,
    }
}

fn infantry(count: f64, bonuses: StatBonuses) -> TroopConfig {
    TroopConfig {
        troop_type: "Infantry".to_string(),
        attack: 10.0,
        defense: 13.0,
        lethality: 10.0,
        health: 15.0,
        count,
        bonuses,
        static_skills: vec![skill(
            "Master Brawler",
            EffectType::DamageIncrease,
            10.0,
            1.0,
            "Lancer",
        )],
        rng_skills: Vec::new(),
        position: Position::Front,
        initiative: 1,
        engagement_rate: None,
    }
}

fn lancer(count: f64, bonuses: StatBonuses) -> TroopConfig {
    TroopConfig {
        troop_type: "Lancer".to_string(),
        attack: 13.0,
        defense: 11.0,
        lethality: 14.0,
        health: 11.0,
        count,
        bonuses,
        static_skills: vec![skill("Charge", EffectType::DamageIncrease, 10.0, 1.0, "Marksman")],
        rng_skills: vec![skill("Ambusher", EffectType::DirectAttack, 0.0, 0.2, "Marksman")],
        position: Position::Middle,
        initiative: 1,
        engagement_rate: None,
    }
}

fn marksman(count: f64, bonuses: StatBonuses) -> TroopConfig {
    TroopConfig {
        troop_type: "Marksman".to_string(),
        attack: 14.0,
        defense: 10.0,
        lethality: 15.0,
        health: 10.0,
        count,
        bonuses,
        static_skills: vec![skill(
            "Ranged Strike",
            EffectType::DamageIncrease,
            10.0,
            1.0,
            "Infantry",
        )],
        rng_skills: vec![skill("Volley", EffectType::MultiAttack, 0.0, 0.1, "All")],
        position: Position::Back,
        initiative: 1,
        engagement_rate: None,
    }
}

pub fn dave() -> ArmyConfig {
    ArmyConfig {
        name: "Dave".to_string(),
        hero_skills: vec![
            opening_buff("Burning Resolve", EffectType::DamageIncrease, 25.0),
            opening_buff("Vigor Tactics", EffectType::DamageIncrease, 15.0),
            opening_buff("Implacable", EffectType::HealthIncrease, 10.0),
            opening_buff("Positional Battler", EffectType::DamageIncrease, 25.0),
            skill("Dosage Boost", EffectType::DamageIncrease, 200.0, 0.24, "All"),
            skill("Numbing Spores", EffectType::Stun, 0.0, 0.2, "All"),
            lasting(skill("Pyromaniac", EffectType::Burn, 40.0, 0.2, "All"), 3),
            skill("Immolation", EffectType::DamageTakenIncrease, 50.0, 0.5, "All"),
        ],
        troops: vec![
            infantry(331_624.0, bonuses(904.6, 690.5, 1065.1, 1181.8)),
            lancer(317_817.0, bonuses(830.8, 643.9, 849.6, 943.1)),
            marksman(50_366.0, bonuses(826.5, 638.5, 847.8, 956.6)),
        ],
    }
}

pub fn brabo() -> ArmyConfig {
    ArmyConfig {
        name: "Brabo".to_string(),
        hero_skills: vec![
            opening_buff("Battle Manifesto", EffectType::DamageIncrease, 25.0),
            opening_buff("Sword Mentor", EffectType::DamageIncrease, 25.0),
            opening_buff("Vigor Tactics", EffectType::DamageIncrease, 15.0),
            skill("Dosage Boost", EffectType::DamageIncrease, 200.0, 0.37, "All"),
            skill("Numbing Spores", EffectType::Stun, 0.0, 0.2, "All"),
            skill("Onslaught", EffectType::Stun, 0.0, 0.2, "All"),
            lasting(skill("Iron Strength", EffectType::DamageDecrease, 50.0, 0.25, "All"), 2),
            skill("Poison Harpoon", EffectType::DamageIncrease, 50.0, 0.63, "All"),
            skill("Expert Swordsmanship", EffectType::Stun, 0.0, 0.2, "All"),
        ],
        troops: vec![
            infantry(474_098.0, bonuses(779.5, 690.5, 989.2, 824.7)),
            lancer(232_514.0, bonuses(699.1, 615.0, 852.3, 712.8)),
            marksman(309_520.0, bonuses(749.7, 661.5, 907.6, 752.1)),
        ],
    }
}

/// Dave attacks Brabo with the default turn cap and variance and no fixed seed.
pub fn sample_scenario() -> ScenarioFile {
    ScenarioFile {
        max_turns: DEFAULT_MAX_TURNS,
        seed: None,
        variance: None,
        attacker: dave(),
        defender: brabo(),
    }
}
