//! Random decision source for checkpoint failures
//!
//! The runner never calls a random-number generator directly; it draws
//! through this trait so tests can force either branch of a checkpoint.

use rand::Rng;

/// Source of the pseudo-random values behind checkpoint branching.
pub trait ChanceSource: Send + Sync {
    /// Uniform draw in `[0, 1)`. A checkpoint fails when the draw is
    /// strictly greater than its configured threshold.
    fn draw(&self) -> f64;

    /// Pick an index in `[0, len)`, used to select a failure message
    /// from a catalog. `len` is always non-zero.
    fn pick(&self, len: usize) -> usize;
}

/// Production chance source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngChance;

impl ChanceSource for ThreadRngChance {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_is_within_unit_interval() {
        let chance = ThreadRngChance;
        for _ in 0..100 {
            let value = chance.draw();
            assert!((0.0..1.0).contains(&value), "draw out of range: {value}");
        }
    }

    #[test]
    fn test_pick_is_within_bounds() {
        let chance = ThreadRngChance;
        for _ in 0..100 {
            assert!(chance.pick(5) < 5);
        }
        assert_eq!(chance.pick(1), 0);
    }
}
