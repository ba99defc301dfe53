//! Fast PRNG for battle simulation. Uses SplitMix64 for throughput and good statistical quality.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.
//!
//! Skill activation and damage variance draw through [RandomSource] so callers can inject
//! a seeded [Rng] or a [FixedRoll] for fully deterministic runs.

use std::time::{SystemTime, UNIX_EPOCH};

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// 2^-53, maps the top 53 bits of a u64 onto [0, 1).
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Source of uniform draws used by the battle engine.
pub trait RandomSource {
    /// Uniform value in [0, 1).
    fn next_f64(&mut self) -> f64;

    /// Uniform value in [low, high): `low + (high - low) * next_f64()`. `high` itself is only
    /// reached through float rounding. Returns `low` when the range is empty.
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeds from OS entropy, see [entropy_seed].
    pub fn from_entropy() -> Self {
        Self::new(entropy_seed())
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }
}

impl RandomSource for Rng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIT_SCALE
    }
}

/// Always returns the same roll. A roll of `0.0` fires every skill; a roll close to `1.0`
/// fires only skills with `chance >= roll`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRoll(pub f64);

impl RandomSource for FixedRoll {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// Seed from OS entropy, falling back to the system clock when entropy is unavailable.
pub fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            tracing::warn!("os entropy unavailable ({err}), seeding from clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(SPLITMIX64_GOLDEN)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_deterministic() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn splitmix64_different_seeds_differ() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_f64_stays_in_unit_interval() {
        let mut rng = Rng::new(99);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn uniform_respects_bounds_and_collapses_on_empty_range() {
        let mut rng = Rng::new(3);
        for _ in 0..1_000 {
            let v = rng.uniform(0.9, 1.1);
            assert!((0.9..=1.1).contains(&v));
        }
        assert_eq!(rng.uniform(1.0, 1.0), 1.0);
    }

    #[test]
    fn fixed_roll_repeats() {
        let mut roll = FixedRoll(0.25);
        assert_eq!(roll.next_f64(), 0.25);
        assert_eq!(roll.next_f64(), 0.25);
        assert_eq!(roll.uniform(0.0, 4.0), 1.0);
    }

    #[test]
    fn uniform_maps_the_unit_draw_onto_a_half_open_range() {
        assert_eq!(FixedRoll(0.0).uniform(0.9, 1.1), 0.9);
        let near_one = 1.0 - f64::EPSILON;
        assert!(FixedRoll(near_one).uniform(0.0, 4.0) < 4.0);
    }
}
