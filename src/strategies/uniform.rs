use std::fmt;

use super::{Strategy, uniform_index};
use crate::counters::Counters;
use crate::error::Result;

/// Uniform selection strategy - selects arms uniformly at random
///
/// Never exploits, but still records statistics through `update`, which makes
/// it a useful baseline in simulations.
#[derive(Debug)]
pub struct Uniform {
    counters: Counters,
}

impl Uniform {
    /// Creates a new Uniform strategy
    pub fn new(arms: usize) -> Self {
        Self {
            counters: Counters::new(arms),
        }
    }

    /// Creates a new Uniform strategy with a fixed seed
    pub fn with_seed(arms: usize, seed: u64) -> Self {
        Self {
            counters: Counters::with_seed(arms, seed),
        }
    }
}

impl fmt::Display for Uniform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uniform")
    }
}

impl Strategy for Uniform {
    fn select_arm(&self) -> Result<usize> {
        let arms = self.counters.arms();
        let index = self
            .counters
            .with_state(|_, _, rng| uniform_index(arms, rng))?;
        Ok(index + 1)
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}
