use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::counters::StrategyRng;
use crate::error::{BanditError, Result};
use crate::strategies::argmax_all;

/// Reward generator for one simulated arm
pub trait Arm: Send {
    /// Draws one reward
    fn pull(&mut self) -> f64;
}

impl<F> Arm for F
where
    F: FnMut() -> f64 + Send,
{
    fn pull(&mut self) -> f64 {
        self()
    }
}

/// Pays 1 with probability `p`, else 0
#[derive(Debug)]
pub struct Bernoulli {
    p: f64,
    rng: StrategyRng,
}

impl Bernoulli {
    pub fn new(p: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(BanditError::InvalidParameter {
                message: format!("bernoulli p not in [0, 1]: {p}"),
            });
        }
        Ok(Self {
            p,
            rng: StrategyRng::seed_from_u64(seed),
        })
    }
}

impl Arm for Bernoulli {
    fn pull(&mut self) -> f64 {
        if self.rng.random::<f64>() < self.p {
            1.0
        } else {
            0.0
        }
    }
}

/// Normally distributed rewards
#[derive(Debug)]
pub struct Gaussian {
    dist: Normal<f64>,
    rng: StrategyRng,
}

impl Gaussian {
    pub fn new(mean: f64, std_dev: f64, seed: u64) -> Result<Self> {
        let dist = Normal::new(mean, std_dev).map_err(|e| BanditError::InvalidParameter {
            message: format!("gaussian({mean}, {std_dev}): {e}"),
        })?;
        Ok(Self {
            dist,
            rng: StrategyRng::seed_from_u64(seed),
        })
    }
}

impl Arm for Gaussian {
    fn pull(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// Always pays the same reward
#[derive(Clone, Copy, Debug)]
pub struct Constant(pub f64);

impl Arm for Constant {
    fn pull(&mut self) -> f64 {
        self.0
    }
}

/// Description of an arm, built into a fresh generator per simulation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArmSpec {
    Bernoulli { p: f64 },
    Gaussian { mean: f64, std_dev: f64 },
    Constant { value: f64 },
}

impl ArmSpec {
    /// Builds a generator seeded with `seed`
    pub fn build(&self, seed: u64) -> Result<Box<dyn Arm>> {
        Ok(match *self {
            ArmSpec::Bernoulli { p } => Box::new(Bernoulli::new(p, seed)?),
            ArmSpec::Gaussian { mean, std_dev } => Box::new(Gaussian::new(mean, std_dev, seed)?),
            ArmSpec::Constant { value } => Box::new(Constant(value)),
        })
    }

    /// Expected reward
    pub fn mean(&self) -> f64 {
        match *self {
            ArmSpec::Bernoulli { p } => p,
            ArmSpec::Gaussian { mean, .. } => mean,
            ArmSpec::Constant { value } => value,
        }
    }

    /// 1-indexed arms with the highest expected reward
    pub fn best_arms(specs: &[ArmSpec]) -> Vec<usize> {
        let means: Vec<f64> = specs.iter().map(ArmSpec::mean).collect();
        argmax_all(&means).into_iter().map(|i| i + 1).collect()
    }

    /// Bernoulli specs for the given success probabilities
    pub fn bernoullis(probabilities: &[f64]) -> Vec<ArmSpec> {
        probabilities
            .iter()
            .map(|&p| ArmSpec::Bernoulli { p })
            .collect()
    }
}
