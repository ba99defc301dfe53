//! Turn scheduler and battle loop.
//!
//! Each turn: status effects tick (troops, then the army ledger, attacker side first), every
//! living group acts once in descending initiative, then defeat is checked. A [Battle] can be
//! stepped turn by turn, drained lazily through [Battle::events], or run to completion with
//! [simulate_battle].

use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::army::{Army, FiredSkill, SkillRef};
use crate::combat::damage::{apply_damage, compute_damage, Casualties, DamageRoll, DamageVariance};
use crate::combat::events::{BattleEvent, TraceCollector, TraceMode};
use crate::combat::report::BattleReport;
use crate::combat::rng::RandomSource;
use crate::combat::skills::{SkillEffect, SkillTarget};
use crate::combat::status::{StatusEffect, StatusKind};
use crate::combat::troop::TroopKind;
use crate::error::BattleError;

pub const DEFAULT_MAX_TURNS: u32 = 100;

/// Nominal winner when the turn cap is reached with both armies still standing.
pub const DEFAULT_WINNER_ON_TIMEOUT: Side = Side::Defender;

/// The first army passed to a battle is the attacker, the second the defender. Both act every
/// turn; the labels only matter for outcome resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Attacker, Side::Defender];

    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Attacker => 0,
            Self::Defender => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacker => f.write_str("attacker"),
            Self::Defender => f.write_str("defender"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "winner", rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory(Side),
    Draw,
    /// Neither army was wiped out before the cap; carries the nominal winner.
    TurnLimitReached(Side),
}

impl BattleOutcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            Self::Victory(side) | Self::TurnLimitReached(side) => Some(side),
            Self::Draw => None,
        }
    }

    pub fn by_turn_limit(self) -> bool {
        matches!(self, Self::TurnLimitReached(_))
    }
}

impl fmt::Display for BattleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Victory(side) => write!(f, "{side} victory"),
            Self::Draw => f.write_str("draw"),
            Self::TurnLimitReached(side) => {
                write!(f, "turn limit reached, {side} declared winner")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleState {
    Running,
    Finished(BattleOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub max_turns: u32,
    pub variance: DamageVariance,
    pub trace_mode: TraceMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            variance: DamageVariance::default(),
            trace_mode: TraceMode::Events,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub outcome: BattleOutcome,
    pub turns: u32,
    pub report: BattleReport,
    pub events: Vec<BattleEvent>,
}

/// Burn queued by a skill during target selection, applied once the first hit lands.
struct PendingBurn {
    percent: f64,
    duration: u32,
    skill: String,
}

/// Everything an action resolved before the first hit.
struct AttackPlan {
    target: usize,
    modifiers: Vec<f64>,
    burn: Option<PendingBurn>,
    multi_attack: bool,
    cause: Option<SkillRef>,
}

#[derive(Debug)]
pub struct Battle<R> {
    armies: [Army; 2],
    config: SimulationConfig,
    rng: R,
    turn: u32,
    state: BattleState,
    trace: TraceCollector,
}

impl<R: RandomSource> Battle<R> {
    pub fn new(attacker: Army, defender: Army, config: SimulationConfig, rng: R) -> Self {
        Self {
            armies: [attacker, defender],
            config,
            rng,
            turn: 0,
            state: BattleState::Running,
            trace: TraceCollector::from_mode(config.trace_mode),
        }
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.state {
            BattleState::Running => None,
            BattleState::Finished(outcome) => Some(outcome),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn army(&self, side: Side) -> &Army {
        &self.armies[side.index()]
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn report(&self) -> BattleReport {
        BattleReport::new(self.turn, self.outcome(), &self.armies)
    }

    /// Takes the events recorded so far.
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        self.trace.drain().collect()
    }

    /// Lazily runs the battle, yielding events as turns resolve. Yields nothing when tracing
    /// is off.
    pub fn events(&mut self) -> BattleEvents<'_, R> {
        BattleEvents {
            battle: self,
            buffer: Vec::new().into_iter(),
            failed: false,
        }
    }

    pub fn into_armies(self) -> (Army, Army) {
        let [attacker, defender] = self.armies;
        (attacker, defender)
    }

    /// Runs to completion.
    pub fn run(&mut self) -> Result<BattleOutcome, BattleError> {
        loop {
            if let BattleState::Finished(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    /// Resolves one turn, or finishes the battle if it is already decided or out of turns.
    pub fn step(&mut self) -> Result<BattleState, BattleError> {
        if self.is_finished() {
            return Ok(self.state);
        }
        if self.should_stop() {
            self.finish();
            return Ok(self.state);
        }

        self.turn += 1;
        let turn = self.turn;
        tracing::debug!(turn, "turn started");
        self.trace.record(BattleEvent::TurnStarted { turn });

        self.tick_status_effects();
        for (side, actor) in self.action_order() {
            self.act(side, actor)?;
        }

        if self.should_stop() {
            self.finish();
        }
        Ok(self.state)
    }

    fn should_stop(&self) -> bool {
        self.armies.iter().any(Army::is_defeated) || self.turn >= self.config.max_turns
    }

    fn finish(&mut self) {
        let attacker_down = self.armies[Side::Attacker.index()].is_defeated();
        let defender_down = self.armies[Side::Defender.index()].is_defeated();
        let outcome = match (attacker_down, defender_down) {
            (true, true) => BattleOutcome::Draw,
            (false, true) => BattleOutcome::Victory(Side::Attacker),
            (true, false) => BattleOutcome::Victory(Side::Defender),
            (false, false) => BattleOutcome::TurnLimitReached(DEFAULT_WINNER_ON_TIMEOUT),
        };
        self.state = BattleState::Finished(outcome);
        tracing::debug!(turns = self.turn, %outcome, "battle finished");
        self.trace.record(BattleEvent::BattleEnded {
            turns: self.turn,
            outcome,
        });
    }

    fn tick_status_effects(&mut self) {
        let turn = self.turn;
        for army in &mut self.armies {
            for index in 0..army.troops().len() {
                if !army.troops()[index].is_alive() {
                    continue;
                }
                let troop = army.troop_mut(index);
                let Some(damage) = troop.status_mut().tick() else {
                    continue;
                };
                let kind = troop.kind;
                let hit = apply_damage(troop, damage);
                self.trace.record_with(|| BattleEvent::BurnTick {
                    turn,
                    army: army.name.clone(),
                    troop: kind,
                    damage,
                    troops_lost: hit.troops_lost,
                });
                if hit.defeated {
                    self.trace.record_with(|| BattleEvent::TroopDefeated {
                        turn,
                        army: army.name.clone(),
                        troop: kind,
                    });
                }
            }
            army.status_mut().tick();
        }
    }

    /// Living groups of both armies by descending initiative; ties keep attacker-first,
    /// army order.
    fn action_order(&self) -> Vec<(Side, usize)> {
        let mut order: Vec<(Side, usize, i32)> = Side::BOTH
            .into_iter()
            .flat_map(|side| {
                self.armies[side.index()]
                    .troops()
                    .iter()
                    .enumerate()
                    .filter(|(_, troop)| troop.is_alive())
                    .map(move |(index, troop)| (side, index, troop.initiative))
            })
            .collect();
        order.sort_by_key(|&(_, _, initiative)| Reverse(initiative));
        order
            .into_iter()
            .map(|(side, index, _)| (side, index))
            .collect()
    }

    fn act(&mut self, side: Side, actor: usize) -> Result<(), BattleError> {
        let own = side.index();
        let opp = side.opponent().index();
        if !self.armies[own].troops()[actor].is_alive() {
            return Ok(());
        }
        let Some(&default_target) = self.armies[opp].frontline().first() else {
            return Ok(());
        };

        let turn = self.turn;
        let actor_kind = self.armies[own].troops()[actor].kind;
        if self.armies[own]
            .troop_mut(actor)
            .status_mut()
            .consume_stun()
        {
            tracing::trace!(turn, army = %self.armies[own].name, actor = %actor_kind, "stunned");
            self.trace.record_with(|| BattleEvent::Stunned {
                turn,
                army: self.armies[own].name.clone(),
                troop: actor_kind,
            });
            return Ok(());
        }

        let fired = self.armies[own].roll_skills(actor, &mut self.rng);
        let plan = self.plan_attack(side, actor, default_target, &fired);

        let (roll, hit) = self.strike(side, actor, &plan, false)?;

        if let Some(burn) = &plan.burn {
            let damage = roll.damage * burn.percent / 100.0;
            let target = self.armies[opp].troop_mut(plan.target);
            let target_kind = target.kind;
            if target.status_mut().apply_burn(damage, burn.duration) {
                self.trace.record_with(|| BattleEvent::StatusApplied {
                    turn,
                    army: self.armies[opp].name.clone(),
                    troop: Some(target_kind),
                    status: StatusKind::Burn,
                    skill: burn.skill.clone(),
                });
            }
        }

        if plan.multi_attack && !hit.defeated && self.armies[opp].troops()[plan.target].is_alive()
        {
            self.strike(side, actor, &plan, true)?;
        }
        Ok(())
    }

    /// Applies fired skills in order against the opposing army and assembles the modifiers.
    fn plan_attack(
        &mut self,
        side: Side,
        actor: usize,
        default_target: usize,
        fired: &[FiredSkill],
    ) -> AttackPlan {
        let own = side.index();
        let opp = side.opponent().index();
        let turn = self.turn;
        let actor_kind = self.armies[own].troops()[actor].kind;

        let mut plan = AttackPlan {
            target: default_target,
            modifiers: Vec::new(),
            burn: None,
            multi_attack: false,
            cause: None,
        };

        let default_kind = self.armies[opp].troops()[default_target].kind;
        plan.modifiers.extend(
            self.armies[own].troops()[actor]
                .static_skills
                .iter()
                .filter_map(|skill| match skill.effect {
                    SkillEffect::DamageIncrease(value) if skill.target.matches(default_kind) => {
                        Some(value)
                    }
                    _ => None,
                }),
        );

        for skill in fired {
            plan.cause = Some(skill.source);
            tracing::trace!(
                turn,
                army = %self.armies[own].name,
                actor = %actor_kind,
                skill = %skill.name,
                "skill activated"
            );
            self.trace.record_with(|| BattleEvent::SkillActivated {
                turn,
                army: self.armies[own].name.clone(),
                actor: actor_kind,
                skill: skill.name.clone(),
                effect: skill.effect.effect_type(),
            });

            let target_kind = self.armies[opp].troops()[plan.target].kind;
            let applied = match skill.effect {
                SkillEffect::DamageIncrease(value) => {
                    if skill.target.matches(target_kind) {
                        plan.modifiers.push(value);
                    }
                    None
                }
                SkillEffect::Burn(percent) => {
                    plan.burn = Some(PendingBurn {
                        percent,
                        duration: skill.duration,
                        skill: skill.name.clone(),
                    });
                    None
                }
                SkillEffect::Stun => self.armies[opp]
                    .troop_mut(plan.target)
                    .status_mut()
                    .insert_if_absent(StatusEffect::Stun {
                        remaining_turns: skill.duration,
                    })
                    .then_some((Some(target_kind), StatusKind::Stun)),
                SkillEffect::DamageTakenIncrease(value) => self.armies[opp]
                    .troop_mut(plan.target)
                    .status_mut()
                    .insert_if_absent(StatusEffect::DamageTakenIncrease {
                        value,
                        remaining_turns: skill.duration,
                    })
                    .then_some((Some(target_kind), StatusKind::DamageTakenIncrease)),
                SkillEffect::DamageDecrease(value) => self.armies[opp]
                    .status_mut()
                    .insert_if_absent(StatusEffect::DamageDecrease {
                        value,
                        remaining_turns: skill.duration,
                    })
                    .then_some((None, StatusKind::DamageDecrease)),
                SkillEffect::DirectAttack => {
                    self.redirect(side, actor_kind, skill, &mut plan);
                    None
                }
                SkillEffect::MultiAttack => {
                    plan.multi_attack = true;
                    None
                }
                SkillEffect::DefenseIncrease(_) | SkillEffect::HealthIncrease(_) => None,
            };

            if let Some((troop, status)) = applied {
                self.trace.record_with(|| BattleEvent::StatusApplied {
                    turn,
                    army: self.armies[opp].name.clone(),
                    troop,
                    status,
                    skill: skill.name.clone(),
                });
            }
        }

        if let Some(value) = self.armies[opp].troops()[plan.target]
            .status()
            .modifier(StatusKind::DamageTakenIncrease)
        {
            plan.modifiers.push(value);
        }
        plan
    }

    /// Direct attacks bypass the frontline when the named group is still alive.
    fn redirect(
        &mut self,
        side: Side,
        actor_kind: TroopKind,
        skill: &FiredSkill,
        plan: &mut AttackPlan,
    ) {
        let SkillTarget::Troop(kind) = skill.target else {
            return;
        };
        let opponent = &self.armies[side.opponent().index()];
        let Some(index) = opponent.troop_index(kind) else {
            return;
        };
        if !opponent.troops()[index].is_alive() {
            return;
        }
        plan.target = index;
        let turn = self.turn;
        self.trace.record_with(|| BattleEvent::TargetRedirected {
            turn,
            army: self.armies[side.index()].name.clone(),
            actor: actor_kind,
            target: kind,
            skill: skill.name.clone(),
        });
    }

    fn strike(
        &mut self,
        side: Side,
        actor: usize,
        plan: &AttackPlan,
        follow_up: bool,
    ) -> Result<(DamageRoll, Casualties), BattleError> {
        let own = side.index();
        let opp = side.opponent().index();
        let turn = self.turn;

        let roll = compute_damage(
            &self.armies[own].troops()[actor],
            &self.armies[opp].troops()[plan.target],
            &plan.modifiers,
            self.armies[opp].status(),
            self.config.variance,
            &mut self.rng,
        );
        let actor_kind = self.armies[own].troops()[actor].kind;
        if !roll.damage.is_finite() {
            return Err(BattleError::NonFiniteDamage {
                turn,
                army: self.armies[own].name.clone(),
                actor: actor_kind.to_string(),
                damage: roll.damage,
            });
        }

        let target = self.armies[opp].troop_mut(plan.target);
        let target_kind = target.kind;
        let hit = apply_damage(target, roll.damage);

        self.armies[own]
            .troop_mut(actor)
            .credit_kills(hit.troops_lost);
        if let Some(cause) = plan.cause {
            self.armies[own].credit_skill_kills(cause, hit.troops_lost);
        }

        tracing::trace!(
            turn,
            army = %self.armies[own].name,
            actor = %actor_kind,
            target = %target_kind,
            damage = roll.damage,
            troops_lost = hit.troops_lost,
            follow_up,
            "attack resolved"
        );
        self.trace.record_with(|| BattleEvent::Attack {
            turn,
            army: self.armies[own].name.clone(),
            actor: actor_kind,
            defender_army: self.armies[opp].name.clone(),
            target: target_kind,
            engaged: roll.engaged,
            damage: roll.damage,
            troops_lost: hit.troops_lost,
            follow_up,
        });
        if hit.defeated {
            self.trace.record_with(|| BattleEvent::TroopDefeated {
                turn,
                army: self.armies[opp].name.clone(),
                troop: target_kind,
            });
        }
        Ok((roll, hit))
    }
}

/// One-shot, lazily driven event sequence. Each call to `next` resolves turns only as needed.
#[derive(Debug)]
pub struct BattleEvents<'a, R> {
    battle: &'a mut Battle<R>,
    buffer: std::vec::IntoIter<BattleEvent>,
    failed: bool,
}

impl<R: RandomSource> Iterator for BattleEvents<'_, R> {
    type Item = Result<BattleEvent, BattleError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.buffer.next() {
                return Some(Ok(event));
            }
            let pending = self.battle.take_events();
            if !pending.is_empty() {
                self.buffer = pending.into_iter();
                continue;
            }
            if self.failed || self.battle.is_finished() {
                return None;
            }
            if let Err(err) = self.battle.step() {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}

/// Runs one battle start to finish with the given random source.
pub fn simulate_battle<R: RandomSource>(
    attacker: Army,
    defender: Army,
    config: SimulationConfig,
    rng: R,
) -> Result<SimulationResult, BattleError> {
    let mut battle = Battle::new(attacker, defender, config, rng);
    let outcome = battle.run()?;
    Ok(SimulationResult {
        outcome,
        turns: battle.turn(),
        report: battle.report(),
        events: battle.take_events(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::FixedRoll;
    use crate::combat::stats::BaseStats;
    use crate::combat::troop::{Position, TroopGroup};

    fn infantry_army(name: &str, count: f64, health: f64) -> Army {
        Army::new(
            name,
            vec![TroopGroup::new(
                TroopKind::Infantry,
                BaseStats {
                    attack: 10.0,
                    defense: 0.0,
                    lethality: 0.0,
                    health,
                },
                count,
                Position::Front,
            )],
            Vec::new(),
        )
        .expect("valid army")
    }

    fn fixed_config(max_turns: u32) -> SimulationConfig {
        SimulationConfig {
            max_turns,
            variance: DamageVariance::fixed(1.0),
            trace_mode: TraceMode::Events,
        }
    }

    #[test]
    fn first_mover_wipes_out_equal_infantry() {
        let result = simulate_battle(
            infantry_army("X", 100.0, 10.0),
            infantry_army("Y", 100.0, 10.0),
            fixed_config(100),
            FixedRoll(0.5),
        )
        .expect("battle runs");
        assert_eq!(result.outcome, BattleOutcome::Victory(Side::Attacker));
        assert_eq!(result.turns, 1);
        let attacks = result
            .events
            .iter()
            .filter(|e| matches!(e, BattleEvent::Attack { .. }))
            .count();
        assert_eq!(attacks, 1, "defeated group must not act");
    }

    #[test]
    fn zero_turn_cap_ends_without_fighting() {
        let mut battle = Battle::new(
            infantry_army("X", 10.0, 10.0),
            infantry_army("Y", 10.0, 10.0),
            fixed_config(0),
            FixedRoll(0.5),
        );
        assert_eq!(
            battle.run(),
            Ok(BattleOutcome::TurnLimitReached(DEFAULT_WINNER_ON_TIMEOUT))
        );
        assert_eq!(battle.turn(), 0);
    }

    #[test]
    fn step_after_finish_is_a_no_op() {
        let mut battle = Battle::new(
            infantry_army("X", 100.0, 10.0),
            infantry_army("Y", 100.0, 10.0),
            fixed_config(5),
            FixedRoll(0.5),
        );
        let outcome = battle.run().expect("battle runs");
        assert_eq!(battle.step(), Ok(BattleState::Finished(outcome)));
        assert_eq!(battle.turn(), 1);
    }

    #[test]
    fn lazy_events_end_with_battle_ended() {
        let mut battle = Battle::new(
            infantry_army("X", 100.0, 1_000.0),
            infantry_army("Y", 100.0, 1_000.0),
            fixed_config(3),
            FixedRoll(0.5),
        );
        let events: Vec<BattleEvent> = battle
            .events()
            .collect::<Result<_, _>>()
            .expect("no arithmetic faults");
        assert_eq!(events.first(), Some(&BattleEvent::TurnStarted { turn: 1 }));
        assert!(matches!(
            events.last(),
            Some(BattleEvent::BattleEnded { turns: 3, .. })
        ));
        assert!(battle.events().next().is_none(), "sequence is one-shot");
    }

    #[test]
    fn outcome_helpers() {
        assert_eq!(BattleOutcome::Draw.winner(), None);
        assert_eq!(
            BattleOutcome::TurnLimitReached(Side::Defender).winner(),
            Some(Side::Defender)
        );
        assert!(BattleOutcome::TurnLimitReached(Side::Defender).by_turn_limit());
        assert!(!BattleOutcome::Victory(Side::Attacker).by_turn_limit());
        assert_eq!(Side::Attacker.opponent(), Side::Defender);
    }
}
