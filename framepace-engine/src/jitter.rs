// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Bounded random perturbation of job durations.
//!
//! A draw `r` in `[0.0001, 1)` is mapped piecewise-linearly onto
//! `[min, max]` so that `1.0` sits at `r = a`:
//!
//! ```text
//! min = 1 - 0.9 * amount
//! max = 1 + amount * (ceiling - 1)
//! A = 1 - min, B = ceiling - 1, a = B / (A + B)
//!
//! r <= a : min + (1 - min) * r / a
//! r >  a : 1 + (max - 1) * (r - a) / (1 - a)
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Smallest multiplier reachable with `amount == 1`.
const MIN_FACTOR: f64 = 0.1;

/// Lower bound of each random draw.
const MIN_DRAW: f64 = 0.0001;

pub struct Jitter {
    amount: f64,
    ceiling: f64,
    rng: StdRng,
}

impl Jitter {
    #[must_use]
    pub fn new(amount: f64, ceiling: f64, seed: u64) -> Self {
        Self {
            amount,
            ceiling,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Smallest multiplier that can be generated.
    #[must_use]
    pub fn min(&self) -> f64 {
        1.0 - (1.0 - MIN_FACTOR) * self.amount
    }

    /// Largest multiplier that can be generated.
    #[must_use]
    pub fn max(&self) -> f64 {
        1.0 + self.amount * (self.ceiling - 1.0)
    }

    /// Draw the next duration multiplier.
    pub fn generate(&mut self) -> f64 {
        let r: f64 = self.rng.gen_range(MIN_DRAW..1.0);

        let min = self.min();
        let max = self.max();
        let below = 1.0 - min;
        let above = self.ceiling - 1.0;
        if below + above <= 0.0 {
            return 1.0;
        }

        let a = above / (below + above);
        if r <= a {
            min + (1.0 - min) * r / a
        } else {
            1.0 + (max - 1.0) * (r - a) / (1.0 - a)
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn no_jitter_is_exactly_one() {
        let mut jitter = Jitter::new(0.0, 2.0, 7);
        for _ in 0..100 {
            assert_eq!(jitter.generate(), 1.0);
        }
    }

    #[test]
    fn degenerate_bounds_are_one() {
        let mut jitter = Jitter::new(0.0, 1.0, 7);
        assert_eq!(jitter.generate(), 1.0);
    }

    #[test]
    fn draws_stay_within_bounds() {
        let mut jitter = Jitter::new(0.5, 3.0, 1234);
        assert_relative_eq!(jitter.min(), 0.55);
        assert_relative_eq!(jitter.max(), 2.0);
        let (min, max) = (jitter.min() - 1e-9, jitter.max() + 1e-9);
        let mut below_one = 0;
        for _ in 0..1000 {
            let v = jitter.generate();
            assert!((min..=max).contains(&v), "{v} out of range");
            if v < 1.0 {
                below_one += 1;
            }
        }
        // a = B / (A + B) = 2 / 2.45 of the draws land below 1
        assert!(below_one > 700 && below_one < 900, "{below_one}");
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Jitter::new(1.0, 2.0, 99);
        let mut b = Jitter::new(1.0, 2.0, 99);
        for _ in 0..50 {
            assert_eq!(a.generate().to_bits(), b.generate().to_bits());
        }
    }
}
