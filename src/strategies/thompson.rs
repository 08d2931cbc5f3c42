use std::fmt;

use super::{Strategy, argmax_random_tie, require_arms};
use crate::beta::sample_beta;
use crate::counters::{Counters, Snapshot};
use crate::error::{BanditError, Result};

/// Thompson Sampling strategy using Beta posteriors
///
/// Each arm carries an implicit `Beta(alpha + successes, alpha + failures)`
/// posterior, where successes are `value * pulls` and failures the remainder.
/// Rewards are expected in `[0, 1]`. A snapshot without pull counts leaves
/// every posterior at the prior.
#[derive(Debug)]
pub struct Thompson {
    /// Symmetric prior for both Beta shape parameters
    alpha: f64,
    counters: Counters,
}

impl Thompson {
    /// Creates a new Thompson Sampling strategy with prior `alpha`
    pub fn new(arms: usize, alpha: f64) -> Result<Self> {
        Self::from_counters(Counters::new(arms), alpha)
    }

    /// Creates a new Thompson Sampling strategy with a fixed seed
    pub fn with_seed(arms: usize, alpha: f64, seed: u64) -> Result<Self> {
        Self::from_counters(Counters::with_seed(arms, seed), alpha)
    }

    fn from_counters(counters: Counters, alpha: f64) -> Result<Self> {
        require_arms(counters.arms())?;
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(BanditError::InvalidParameter {
                message: format!("alpha not in (0, inf): {alpha}"),
            });
        }
        Ok(Self { alpha, counters })
    }

    /// Gets the prior
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Posterior `(alpha, beta)` shape parameters of every arm
    pub fn posteriors(&self) -> Vec<(f64, f64)> {
        self.counters.with_state(|counts, values, _| {
            counts
                .iter()
                .zip(values)
                .map(|(&count, &value)| self.posterior(count, value))
                .collect()
        })
    }

    fn posterior(&self, count: u64, value: f64) -> (f64, f64) {
        let pulls = count as f64;
        let successes = (value * pulls).clamp(0.0, pulls);
        let failures = pulls - successes;
        (self.alpha + successes, self.alpha + failures)
    }
}

impl fmt::Display for Thompson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thompson(alpha={:.2})", self.alpha)
    }
}

impl Strategy for Thompson {
    fn select_arm(&self) -> Result<usize> {
        self.counters.with_state(|counts, values, rng| {
            let samples = counts
                .iter()
                .zip(values)
                .map(|(&count, &value)| {
                    let (a, b) = self.posterior(count, value);
                    sample_beta(a, b, rng)
                })
                .collect::<Result<Vec<f64>>>()?;
            Ok(argmax_random_tie(&samples, rng)? + 1)
        })
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.counts.is_none() {
            tracing::warn!(strategy = %self, "Snapshot has no pull counts, posteriors fall back to the prior");
        }
        self.counters.init(snapshot)
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}
