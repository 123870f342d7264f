//! Combat draws - the only source of non-determinism in a resolution

use std::collections::VecDeque;

use rand::Rng;

use super::roster::{ActionSpec, Magnitude};

/// Random source used when rolling an action
pub trait Dice {
    /// Uniform integer in `[range.min, range.max]`
    fn roll(&mut self, range: Magnitude) -> u32;

    /// True with the given probability
    fn chance(&mut self, probability: f64) -> bool;
}

/// Dice backed by any `rand` generator
pub struct RandomDice<'a, R: Rng + ?Sized>(pub &'a mut R);

impl<R: Rng + ?Sized> Dice for RandomDice<'_, R> {
    fn roll(&mut self, range: Magnitude) -> u32 {
        if range.min >= range.max {
            return range.min;
        }
        self.0.gen_range(range.min..=range.max)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.0.gen_bool(probability.clamp(0.0, 1.0))
    }
}

/// Dice that replay preset values. Rolls are clamped into the requested range;
/// an exhausted script rolls the range minimum and never crits.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    rolls: VecDeque<u32>,
    chances: VecDeque<bool>,
}

impl ScriptedDice {
    pub fn new(rolls: impl IntoIterator<Item = u32>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            chances: VecDeque::new(),
        }
    }

    pub fn with_chances(mut self, chances: impl IntoIterator<Item = bool>) -> Self {
        self.chances = chances.into_iter().collect();
        self
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, range: Magnitude) -> u32 {
        self.rolls
            .pop_front()
            .map(|v| v.clamp(range.min, range.max))
            .unwrap_or(range.min)
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }
}

/// The drawn numbers for one action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRoll {
    /// Damage or healing to apply to the target
    pub amount: u32,
    /// Damage the actor takes
    pub recoil: Option<u32>,
    pub critical: bool,
}

impl ActionRoll {
    /// Draw order: critical check, magnitude, recoil
    pub fn draw<D: Dice + ?Sized>(spec: &ActionSpec, dice: &mut D) -> Self {
        let critical = spec
            .critical
            .map(|c| dice.chance(c.chance))
            .unwrap_or(false);

        let mut amount = dice.roll(spec.magnitude);
        if critical {
            if let Some(c) = spec.critical {
                amount = amount * c.multiplier_percent / 100;
            }
        }

        let recoil = spec.recoil.map(|r| dice.roll(r));

        Self {
            amount,
            recoil,
            critical,
        }
    }
}
