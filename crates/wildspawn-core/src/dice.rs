//! Random draws used by point generation and rule resolution.
//!
//! Everything random in the engine goes through [`Dice`] so tests can
//! script exact outcomes with [`ScriptedDice`].

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform random draws.
pub trait Dice: Send {
    /// A uniform value in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// A uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// [`Dice`] backed by a seeded [`StdRng`].
#[derive(Debug)]
pub struct RngDice {
    rng: StdRng,
}

impl RngDice {
    /// Create dice seeded with `seed` for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Dice for RngDice {
    fn roll(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.random_range(0..len)
    }
}

/// [`Dice`] that replays scripted values.
///
/// `roll` pops from the roll script and `pick` from the pick script. An
/// exhausted roll script yields `0.0` and an exhausted pick script yields
/// index `0`, so short scripts keep tests readable.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<f64>,
    picks: VecDeque<usize>,
}

impl ScriptedDice {
    /// Dice that replay `rolls` in order.
    pub fn new(rolls: &[f64]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
            picks: VecDeque::new(),
        }
    }

    /// Add scripted `pick` results.
    #[must_use]
    pub fn with_picks(mut self, picks: &[usize]) -> Self {
        self.picks.extend(picks.iter().copied());
        self
    }

    /// Append more roll values.
    pub fn push_rolls(&mut self, rolls: &[f64]) {
        self.rolls.extend(rolls.iter().copied());
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(0.0)
    }

    fn pick(&mut self, len: usize) -> usize {
        let idx = self.picks.pop_front().unwrap_or(0);
        if len == 0 { 0 } else { idx % len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_dice_are_reproducible() {
        let mut a = RngDice::seeded(9);
        let mut b = RngDice::seeded(9);
        for _ in 0..16 {
            let (ra, rb) = (a.roll(), b.roll());
            assert!((ra - rb).abs() < f64::EPSILON);
            assert!((0.0..1.0).contains(&ra));
            assert_eq!(a.pick(7), b.pick(7));
        }
    }

    #[test]
    fn scripted_dice_replay_then_default() {
        let mut dice = ScriptedDice::new(&[0.25, 0.75]).with_picks(&[3]);
        assert!((dice.roll() - 0.25).abs() < f64::EPSILON);
        assert!((dice.roll() - 0.75).abs() < f64::EPSILON);
        assert!(dice.roll().abs() < f64::EPSILON);
        assert_eq!(dice.pick(2), 1);
        assert_eq!(dice.pick(2), 0);
    }
}
