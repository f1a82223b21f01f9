//! Deterministic simulation-level RNG wrapper.
//!
//! The only randomness in the engine is synthetic site placement.  It is
//! drawn from a single seeded `SmallRng` so the same seed always produces
//! the same catalog, and therefore the same association log.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Seeded RNG for synthetic site placement.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
