//! Random ordering
//!
//! Spreads shards across workers when dependency order is enforced
//! elsewhere. No depth is computed and nothing is filtered.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Orders shards by a uniformly random permutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shuffle {
    seed: Option<u64>,
}

impl Shuffle {
    /// Shuffles with the thread-local generator
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Shuffles with a fixed seed; equal-length batches get the same permutation
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the batch in random order
    pub fn shuffle<T>(&self, mut batch: Vec<T>) -> Vec<T> {
        match self.seed {
            Some(seed) => batch.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => batch.shuffle(&mut rand::thread_rng()),
        }
        batch
    }
}
