use super::Engine;
use crate::rules::MoveDescriptor;
use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Uniformly random among the legal moves: no weighting, no lookahead.
pub struct RandomEngine {
    rng: StdRng,
}

impl Default for RandomEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomEngine {
    pub fn new() -> RandomEngine {
        RandomEngine {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> RandomEngine {
        RandomEngine {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Engine for RandomEngine {
    fn search(&mut self, mut legal_moves: Vec<MoveDescriptor>) -> Option<MoveDescriptor> {
        if legal_moves.is_empty() {
            return None;
        }
        let idx = self.rng.random_range(0..legal_moves.len());
        debug!("picked move {} of {}", idx + 1, legal_moves.len());

        Some(legal_moves.swap_remove(idx))
    }
}
