//! Injected random source. Nothing in the engine draws randomness any other way.

use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::VecDeque;

pub trait BattleRng {
    /// Uniform draw in `[0, 1)`.
    fn roll(&mut self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        let idx = (self.roll() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }

    /// True with probability `chance`; never draws for certain outcomes.
    fn chance(&mut self, chance: f64) -> bool {
        if chance >= 1.0 {
            return true;
        }
        if chance <= 0.0 {
            return false;
        }
        self.roll() < chance
    }
}

impl BattleRng for SmallRng {
    fn roll(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl<R: BattleRng + ?Sized> BattleRng for &mut R {
    fn roll(&mut self) -> f64 {
        (**self).roll()
    }
}

/// Replays a fixed roll sequence, then repeats `fallback` once exhausted.
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    rolls: VecDeque<f64>,
    fallback: f64,
    drawn: usize,
}

impl ScriptedRng {
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback: 0.0,
            drawn: 0,
        }
    }

    pub fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of rolls consumed so far.
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl BattleRng for ScriptedRng {
    fn roll(&mut self) -> f64 {
        self.drawn += 1;
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn scripted_rolls_replay_in_order() {
        let mut rng = ScriptedRng::new([0.25, 0.75]).with_fallback(0.5);
        assert_eq!(rng.roll(), 0.25);
        assert_eq!(rng.roll(), 0.75);
        assert_eq!(rng.roll(), 0.5);
        assert_eq!(rng.drawn(), 3);
    }

    #[test]
    fn certain_chances_do_not_draw() {
        let mut rng = ScriptedRng::new([0.1]);
        assert!(rng.chance(1.0));
        assert!(!rng.chance(0.0));
        assert_eq!(rng.drawn(), 0);
        assert!(rng.chance(0.2));
        assert_eq!(rng.drawn(), 1);
    }

    #[test]
    fn pick_stays_in_bounds() {
        let mut rng = ScriptedRng::new([0.0, 0.999_999, 0.5]);
        assert_eq!(rng.pick(3), 0);
        assert_eq!(rng.pick(3), 2);
        assert_eq!(rng.pick(4), 2);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = SmallRng::seed_from_u64(9);
        let mut b = SmallRng::seed_from_u64(9);
        for _ in 0..8 {
            assert_eq!(BattleRng::roll(&mut a), BattleRng::roll(&mut b));
        }
    }
}
