//! Timed status effects attached to a troop group or to a whole army.
//!
//! A ledger holds at most one effect per [StatusKind]. Reapplying a kind either leaves the
//! existing entry alone (stun, damage modifiers) or refreshes it in place (burn).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Stun,
    Burn,
    DamageTakenIncrease,
    DamageDecrease,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusEffect {
    Stun { remaining_turns: u32 },
    /// `damage` is dealt at every tick until the burn expires.
    Burn { damage: f64, remaining_turns: u32 },
    /// Percentage added to every hit the holder takes.
    DamageTakenIncrease { value: f64, remaining_turns: u32 },
    /// Percentage widening of the holder's defense.
    DamageDecrease { value: f64, remaining_turns: u32 },
}

impl StatusEffect {
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Stun { .. } => StatusKind::Stun,
            Self::Burn { .. } => StatusKind::Burn,
            Self::DamageTakenIncrease { .. } => StatusKind::DamageTakenIncrease,
            Self::DamageDecrease { .. } => StatusKind::DamageDecrease,
        }
    }

    pub const fn remaining_turns(&self) -> u32 {
        match self {
            Self::Stun { remaining_turns }
            | Self::Burn {
                remaining_turns, ..
            }
            | Self::DamageTakenIncrease {
                remaining_turns, ..
            }
            | Self::DamageDecrease {
                remaining_turns, ..
            } => *remaining_turns,
        }
    }

    fn remaining_turns_mut(&mut self) -> &mut u32 {
        match self {
            Self::Stun { remaining_turns }
            | Self::Burn {
                remaining_turns, ..
            }
            | Self::DamageTakenIncrease {
                remaining_turns, ..
            }
            | Self::DamageDecrease {
                remaining_turns, ..
            } => remaining_turns,
        }
    }

    /// Modifier percentage for value-carrying effects.
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::DamageTakenIncrease { value, .. } | Self::DamageDecrease { value, .. } => {
                Some(*value)
            }
            Self::Burn { .. } | Self::Stun { .. } => None,
        }
    }

    /// Decrements the duration; true when the effect has run out.
    fn decrement(&mut self) -> bool {
        let turns = self.remaining_turns_mut();
        *turns = turns.saturating_sub(1);
        *turns == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLedger {
    effects: Vec<StatusEffect>,
}

impl StatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|effect| effect.kind() == kind)
    }

    pub fn contains(&self, kind: StatusKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    /// Value of an active modifier of `kind`, if any.
    pub fn modifier(&self, kind: StatusKind) -> Option<f64> {
        self.get(kind).and_then(StatusEffect::value)
    }

    /// Adds the effect unless one of the same kind is active. Returns whether it was added.
    pub fn insert_if_absent(&mut self, effect: StatusEffect) -> bool {
        if self.contains(effect.kind()) {
            return false;
        }
        self.effects.push(effect);
        true
    }

    /// Starts a burn or, if one is active, adds `damage` to it and resets its duration.
    /// Returns true when a new burn was started.
    pub fn apply_burn(&mut self, damage: f64, duration: u32) -> bool {
        for effect in &mut self.effects {
            if let StatusEffect::Burn {
                damage: stored,
                remaining_turns,
            } = effect
            {
                *stored += damage;
                *remaining_turns = duration;
                return false;
            }
        }
        self.effects.push(StatusEffect::Burn {
            damage,
            remaining_turns: duration,
        });
        true
    }

    /// Consumes one turn of stun if the holder is stunned. Returns whether it was stunned.
    pub fn consume_stun(&mut self) -> bool {
        let Some(index) = self
            .effects
            .iter()
            .position(|effect| effect.kind() == StatusKind::Stun)
        else {
            return false;
        };
        if self.effects[index].decrement() {
            self.effects.remove(index);
        }
        true
    }

    /// Start-of-turn tick: collects burn damage due this turn, then decrements every effect,
    /// stun included, and drops the expired ones. A stun that survives the tick is decremented
    /// again by [consume_stun] when its holder would act. Returns the burn damage owed, if any.
    ///
    /// [consume_stun]: StatusLedger::consume_stun
    pub fn tick(&mut self) -> Option<f64> {
        let burn = self.effects.iter().find_map(|effect| match effect {
            StatusEffect::Burn { damage, .. } => Some(*damage),
            _ => None,
        });
        self.effects.retain_mut(|effect| !effect.decrement());
        burn
    }
}
