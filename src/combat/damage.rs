//! Damage model: per-hit damage and its conversion into casualties.
//!
//! `damage_per_troop = attack * (1 + lethality/100) * (1 + Σmods/100) / (defense + 1) * variance`
//! and the hit totals `damage_per_troop * engaged_troops`.

use serde::{Deserialize, Serialize};

use crate::combat::rng::RandomSource;
use crate::combat::status::{StatusKind, StatusLedger};
use crate::combat::troop::TroopGroup;

/// Share of casualties booked as lightly injured; the rest are severely injured.
pub const LIGHTLY_INJURED_RATIO: f64 = 0.65;
pub const SEVERELY_INJURED_RATIO: f64 = 1.0 - LIGHTLY_INJURED_RATIO;

/// Inclusive range the per-hit variance multiplier is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageVariance {
    pub low: f64,
    pub high: f64,
}

impl DamageVariance {
    pub const fn fixed(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }

    /// Always consumes one draw so the random stream does not depend on the range.
    pub fn sample<R: RandomSource + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.uniform(self.low, self.high)
    }
}

impl Default for DamageVariance {
    fn default() -> Self {
        Self {
            low: 0.9,
            high: 1.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub damage: f64,
    /// Attacking troops that took part; reporting only.
    pub engaged: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Casualties {
    pub troops_lost: f64,
    /// True when this hit took the group from alive to defeated.
    pub defeated: bool,
}

/// Defense after damage-decrease effects on the target and on its army, each applied
/// multiplicatively.
pub fn widened_defense(target: &TroopGroup, defender_status: &StatusLedger) -> f64 {
    let mut defense = target.stats().defense;
    if let Some(value) = target.status().modifier(StatusKind::DamageDecrease) {
        defense *= 1.0 + value / 100.0;
    }
    if let Some(value) = defender_status.modifier(StatusKind::DamageDecrease) {
        defense *= 1.0 + value / 100.0;
    }
    defense
}

/// Damage of one hit from `attacker` on `target`. `modifiers` are percentages summed into one
/// multiplier; `defender_status` is the target army's ledger.
pub fn compute_damage<R: RandomSource + ?Sized>(
    attacker: &TroopGroup,
    target: &TroopGroup,
    modifiers: &[f64],
    defender_status: &StatusLedger,
    variance: DamageVariance,
    rng: &mut R,
) -> DamageRoll {
    let stats = attacker.stats();
    let defense = widened_defense(target, defender_status);

    let mut base_damage = stats.attack * (1.0 + stats.lethality / 100.0);
    let total_modifier: f64 = modifiers.iter().sum();
    base_damage *= 1.0 + total_modifier / 100.0;

    let damage_per_troop = base_damage / (defense + 1.0) * variance.sample(rng);
    let engaged = attacker.engaged_troops();

    DamageRoll {
        damage: damage_per_troop * engaged as f64,
        engaged,
    }
}

/// Converts `damage` into lost troops on `defender`. Attribution is left to the caller.
pub fn apply_damage(defender: &mut TroopGroup, damage: f64) -> Casualties {
    let was_alive = defender.is_alive();
    let troops = damage / defender.stats().health;
    let troops_lost = defender.remove_troops(troops, LIGHTLY_INJURED_RATIO);
    Casualties {
        troops_lost,
        defeated: was_alive && !defender.is_alive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::FixedRoll;
    use crate::combat::stats::{BaseStats, StatBonuses};
    use crate::combat::status::StatusEffect;
    use crate::combat::troop::{Position, TroopKind};

    fn approx_eq(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9, "expected {b}, got {a}");
    }

    fn troop(kind: TroopKind, count: f64, attack: f64, defense: f64, health: f64) -> TroopGroup {
        TroopGroup::new(
            kind,
            BaseStats {
                attack,
                defense,
                lethality: 0.0,
                health,
            },
            count,
            Position::Front,
        )
    }

    #[test]
    fn infantry_clash_matches_hand_computation() {
        let attacker = troop(TroopKind::Infantry, 100.0, 10.0, 0.0, 10.0);
        let target = troop(TroopKind::Infantry, 100.0, 10.0, 0.0, 10.0);
        let roll = compute_damage(
            &attacker,
            &target,
            &[],
            &StatusLedger::new(),
            DamageVariance::fixed(1.0),
            &mut FixedRoll(0.5),
        );
        // 10 / (0 + 1) per troop, 300 engaged.
        assert_eq!(roll.engaged, 300);
        approx_eq(roll.damage, 3_000.0);
    }

    #[test]
    fn lethality_modifiers_and_defense_combine() {
        let attacker = TroopGroup::new(
            TroopKind::Lancer,
            BaseStats {
                attack: 20.0,
                defense: 0.0,
                lethality: 50.0,
                health: 1.0,
            },
            10.0,
            Position::Middle,
        )
        .with_bonuses(StatBonuses {
            attack: 100.0,
            ..StatBonuses::default()
        });
        let target = troop(TroopKind::Infantry, 10.0, 0.0, 9.0, 1.0);
        let roll = compute_damage(
            &attacker,
            &target,
            &[10.0, 40.0],
            &StatusLedger::new(),
            DamageVariance::fixed(1.0),
            &mut FixedRoll(0.0),
        );
        // 40 * 1.5 * 1.5 / 10 = 9 per troop, 10 engaged.
        assert_eq!(roll.engaged, 10);
        approx_eq(roll.damage, 90.0);
    }

    #[test]
    fn damage_decrease_widens_defense_multiplicatively() {
        let mut target = troop(TroopKind::Infantry, 10.0, 0.0, 10.0, 1.0);
        target.status_mut().insert_if_absent(StatusEffect::DamageDecrease {
            value: 50.0,
            remaining_turns: 1,
        });
        let mut army_status = StatusLedger::new();
        army_status.insert_if_absent(StatusEffect::DamageDecrease {
            value: 100.0,
            remaining_turns: 2,
        });
        approx_eq(widened_defense(&target, &army_status), 30.0);
        approx_eq(widened_defense(&target, &StatusLedger::new()), 15.0);
    }

    #[test]
    fn variance_is_drawn_from_range() {
        let attacker = troop(TroopKind::Lancer, 1.0, 10.0, 0.0, 1.0);
        let target = troop(TroopKind::Lancer, 1.0, 0.0, 0.0, 1.0);
        let low = compute_damage(
            &attacker,
            &target,
            &[],
            &StatusLedger::new(),
            DamageVariance::default(),
            &mut FixedRoll(0.0),
        );
        let mid = compute_damage(
            &attacker,
            &target,
            &[],
            &StatusLedger::new(),
            DamageVariance::default(),
            &mut FixedRoll(0.5),
        );
        approx_eq(low.damage, 9.0);
        approx_eq(mid.damage, 10.0);
    }

    #[test]
    fn apply_damage_caps_losses_and_books_injuries() {
        let mut target = troop(TroopKind::Infantry, 100.0, 0.0, 0.0, 10.0);
        let hit = apply_damage(&mut target, 250.0);
        approx_eq(hit.troops_lost, 25.0);
        assert!(!hit.defeated);
        approx_eq(target.count(), 75.0);
        approx_eq(target.total_health(), 750.0);
        approx_eq(target.lightly_injured(), 25.0 * LIGHTLY_INJURED_RATIO);
        approx_eq(target.severely_injured(), 25.0 * SEVERELY_INJURED_RATIO);

        let hit = apply_damage(&mut target, 1e9);
        approx_eq(hit.troops_lost, 75.0);
        assert!(hit.defeated);
        assert!(!target.is_alive());
        assert_eq!(target.count(), 0.0);

        let hit = apply_damage(&mut target, 50.0);
        assert_eq!(hit.troops_lost, 0.0);
        assert!(!hit.defeated);
    }
}
