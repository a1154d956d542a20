//! Seeded sampling used by randomized search strategies.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Seeded RNG. A fixed `seed: u64` always produces the same sampling order.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Creates a handle from a seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniformly shuffles `items` and keeps at most `limit` of them.
    pub fn sample<T>(&mut self, mut items: Vec<T>, limit: usize) -> Vec<T> {
        items.shuffle(&mut self.rng);
        items.truncate(limit);
        items
    }
}
