use std::fmt;

use rand::Rng;

use super::{Strategy, require_arms};
use crate::counters::Counters;
use crate::error::{BanditError, Result};

/// Softmax (Boltzmann) strategy
///
/// Selects arms in proportion to `exp(value / tau)`. Low temperatures approach
/// greedy selection, high temperatures approach uniform selection.
#[derive(Debug)]
pub struct Softmax {
    tau: f64,
    counters: Counters,
}

impl Softmax {
    /// Creates a new Softmax strategy with temperature `tau`
    pub fn new(arms: usize, tau: f64) -> Result<Self> {
        Self::from_counters(Counters::new(arms), tau)
    }

    /// Creates a new Softmax strategy with a fixed seed
    pub fn with_seed(arms: usize, tau: f64, seed: u64) -> Result<Self> {
        Self::from_counters(Counters::with_seed(arms, seed), tau)
    }

    fn from_counters(counters: Counters, tau: f64) -> Result<Self> {
        require_arms(counters.arms())?;
        if !(tau.is_finite() && tau > 0.0) {
            return Err(BanditError::InvalidParameter {
                message: format!("tau not in (0, inf): {tau}"),
            });
        }
        Ok(Self { tau, counters })
    }

    /// Gets the temperature
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Current selection probability of each arm
    pub fn probabilities(&self) -> Result<Vec<f64>> {
        softmax_probabilities(&self.counters.values(), self.tau)
    }
}

/// Max-subtracted softmax of `scores` at temperature `tau`.
pub fn softmax_probabilities(scores: &[f64], tau: f64) -> Result<Vec<f64>> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = scores.iter().map(|s| ((s - max) / tau).exp()).collect();
    let normalizer: f64 = weights.iter().sum();
    if !normalizer.is_finite() || normalizer <= 0.0 {
        return Err(BanditError::NumericalError {
            message: format!("softmax normalizer is {normalizer} (tau={tau})"),
        });
    }
    Ok(weights.into_iter().map(|w| w / normalizer).collect())
}

impl fmt::Display for Softmax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Softmax(tau={:.2})", self.tau)
    }
}

impl Strategy for Softmax {
    fn select_arm(&self) -> Result<usize> {
        self.counters.with_state(|_, values, rng| {
            let probabilities = softmax_probabilities(values, self.tau)?;
            let z: f64 = rng.random();

            // rounding can leave the cumulative sum just short of 1
            let mut draw = probabilities.len() - 1;
            let mut cumulative = 0.0;
            for (i, p) in probabilities.iter().enumerate() {
                cumulative += p;
                if cumulative > z {
                    draw = i;
                    break;
                }
            }
            Ok(draw + 1)
        })
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}
