//! Random number plumbing for the simulation.
//!
//! Every draw goes through a [`RandomSource`] owned by one engine, so two
//! matches never share generator state and tests can script the draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniform floats in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;
}

/// Production source backed by `StdRng`.
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible stream for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// True with probability `p`.
pub fn chance<R: RandomSource + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.next_f64() < p
}

/// Uniform index into a collection of `len` items.
pub fn pick_index<R: RandomSource + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let index = (rng.next_f64() * len as f64) as usize;
    Some(index.min(len - 1))
}

/// Cumulative-weight draw. Negative or NaN weights count as zero; when
/// nothing carries weight the first index is returned.
pub fn weighted_index<R: RandomSource + ?Sized>(rng: &mut R, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let clean = |w: &f64| if w.is_finite() { w.max(0.0) } else { 0.0 };
    let total: f64 = weights.iter().map(clean).sum();
    if total <= 0.0 {
        return Some(0);
    }

    let mut remaining = rng.next_f64() * total;
    let mut last_weighted = 0;
    for (i, w) in weights.iter().enumerate() {
        let w = clean(w);
        if w <= 0.0 {
            continue;
        }
        last_weighted = i;
        remaining -= w;
        if remaining <= 0.0 {
            return Some(i);
        }
    }

    // Float residue after the last subtraction
    Some(last_weighted)
}

/// Replays a fixed list of draws, then repeats `fallback`.
#[cfg(test)]
pub(crate) struct ScriptedRandom {
    values: std::collections::VecDeque<f64>,
    fallback: f64,
}

#[cfg(test)]
impl ScriptedRandom {
    pub(crate) fn new(values: &[f64]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            fallback: 0.0,
        }
    }

    pub(crate) fn with_fallback(mut self, fallback: f64) -> Self {
        self.fallback = fallback;
        self
    }

    pub(crate) fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_random_range() {
        let mut rng = StdRandom::from_entropy();
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_seeded_streams_repeat() {
        let mut a = StdRandom::seeded(42);
        let mut b = StdRandom::seeded(42);
        for _ in 0..20 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn test_pick_index() {
        let mut rng = ScriptedRandom::new(&[0.0, 0.5, 0.9999]);
        assert_eq!(pick_index(&mut rng, 4), Some(0));
        assert_eq!(pick_index(&mut rng, 4), Some(2));
        assert_eq!(pick_index(&mut rng, 4), Some(3));
        assert_eq!(pick_index(&mut rng, 0), None);
    }

    #[test]
    fn test_weighted_index_is_proportional() {
        // weights 1, 3 -> cumulative 0.25 / 1.0
        let weights = [1.0, 3.0];
        let mut rng = ScriptedRandom::new(&[0.2, 0.3, 0.99]);
        assert_eq!(weighted_index(&mut rng, &weights), Some(0));
        assert_eq!(weighted_index(&mut rng, &weights), Some(1));
        assert_eq!(weighted_index(&mut rng, &weights), Some(1));
    }

    #[test]
    fn test_weighted_index_not_argmax() {
        let weights = [10.0, 1.0];
        let mut rng = StdRandom::seeded(7);
        let picks_low = (0..2000)
            .filter(|_| weighted_index(&mut rng, &weights) == Some(1))
            .count();
        assert!(picks_low > 50, "lighter weight never chosen: {}", picks_low);
    }

    #[test]
    fn test_weighted_index_all_zero_falls_back_to_first() {
        let mut rng = ScriptedRandom::new(&[0.7]);
        assert_eq!(weighted_index(&mut rng, &[0.0, 0.0, 0.0]), Some(0));
        // no draw consumed
        assert_eq!(rng.remaining(), 1);
        assert_eq!(weighted_index(&mut rng, &[]), None);
    }

    #[test]
    fn test_weighted_index_skips_bad_weights() {
        let mut rng = ScriptedRandom::new(&[0.0, 0.999_999]);
        let weights = [f64::NAN, -4.0, 2.0];
        assert_eq!(weighted_index(&mut rng, &weights), Some(2));
        assert_eq!(weighted_index(&mut rng, &weights), Some(2));
    }

    #[test]
    fn test_chance() {
        let mut rng = ScriptedRandom::new(&[0.1, 0.5]);
        assert!(chance(&mut rng, 0.15));
        assert!(!chance(&mut rng, 0.4));
    }
}
