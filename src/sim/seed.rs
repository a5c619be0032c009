//! Seed provider
//!
//! Two independent streams come out of here: level seeds (drawn on every
//! restart) and per-obstacle motion parameters. Obstacle *types* follow the
//! level seed; obstacle *motion* does not.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Seed plus stream selector, enough to rebuild a `Pcg32`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ self.stream.rotate_left(32))
    }
}

/// Draws fresh level seeds and hands out the motion stream
#[derive(Debug, Clone)]
pub struct SeedSource {
    seeds: Pcg32,
    motion: Pcg32,
}

impl SeedSource {
    /// Motion parameters use stream 1 so they never correlate with level seeds
    pub fn new(entropy: u64) -> Self {
        Self {
            seeds: RngState::new(entropy).to_rng(),
            motion: RngState { seed: entropy, stream: 1 }.to_rng(),
        }
    }

    /// Draw a level seed that differs from `previous`
    pub fn next_seed(&mut self, previous: u64) -> u64 {
        loop {
            let seed = self.seeds.random::<u64>();
            if seed != previous {
                return seed;
            }
        }
    }

    /// RNG used when instantiating obstacles
    pub fn motion_rng(&mut self) -> &mut Pcg32 {
        &mut self.motion
    }
}
