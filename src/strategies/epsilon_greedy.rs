use std::fmt;

use rand::Rng;

use super::{Strategy, argmax_random_tie, require_arms, uniform_index};
use crate::counters::Counters;
use crate::error::{BanditError, Result};

/// Epsilon-greedy strategy - explores with probability epsilon, exploits otherwise
///
/// Exploitation picks uniformly among all arms tied for the best mean reward.
/// Exploration picks uniformly among all arms, the current best included.
#[derive(Debug)]
pub struct EpsilonGreedy {
    epsilon: f64,
    counters: Counters,
}

impl EpsilonGreedy {
    /// Creates a new EpsilonGreedy strategy over `arms` arms
    pub fn new(arms: usize, epsilon: f64) -> Result<Self> {
        Self::from_counters(Counters::new(arms), epsilon)
    }

    /// Creates a new EpsilonGreedy strategy with a fixed seed
    pub fn with_seed(arms: usize, epsilon: f64, seed: u64) -> Result<Self> {
        Self::from_counters(Counters::with_seed(arms, seed), epsilon)
    }

    fn from_counters(counters: Counters, epsilon: f64) -> Result<Self> {
        require_arms(counters.arms())?;
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(BanditError::InvalidParameter {
                message: format!("epsilon not in [0, 1]: {epsilon}"),
            });
        }
        Ok(Self { epsilon, counters })
    }

    /// Gets the epsilon value
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl fmt::Display for EpsilonGreedy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EpsilonGreedy(epsilon={:.2})", self.epsilon)
    }
}

impl Strategy for EpsilonGreedy {
    fn select_arm(&self) -> Result<usize> {
        let index = self.counters.with_state(|_, values, rng| {
            let z: f64 = rng.random();
            if z >= self.epsilon {
                argmax_random_tie(values, rng)
            } else {
                uniform_index(values.len(), rng)
            }
        })?;
        Ok(index + 1)
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}
