//! Beta random variates by rejection sampling.
//!
//! Follows R.C.H. Cheng, "Generating Beta Variates with Nonintegral Shape
//! Parameters" (algorithm BA), which works for any `α, β > 0`.

use rand::Rng;
use rand::SeedableRng;
use rand::distr::Open01;

use crate::counters::StrategyRng;
use crate::error::{BanditError, Result};

/// Upper bound on rejected proposals before a draw is abandoned.
pub const MAX_REJECTIONS: usize = 100_000;

/// Draws `x ~ Beta(alpha, beta)` from `rng`.
pub fn sample_beta<R: Rng + ?Sized>(alpha: f64, beta: f64, rng: &mut R) -> Result<f64> {
    sample_beta_capped(alpha, beta, rng, MAX_REJECTIONS)
}

/// [`sample_beta`] giving up after `max_rejections` proposals.
pub(crate) fn sample_beta_capped<R: Rng + ?Sized>(
    alpha: f64,
    beta: f64,
    rng: &mut R,
    max_rejections: usize,
) -> Result<f64> {
    if !(alpha.is_finite() && beta.is_finite()) || alpha <= 0.0 || beta <= 0.0 {
        return Err(BanditError::InvalidParameter {
            message: format!("beta shape parameters must be positive, got ({alpha}, {beta})"),
        });
    }

    let a = alpha + beta;
    let b = if alpha.min(beta) <= 1.0 {
        (1.0 / alpha).max(1.0 / beta)
    } else {
        ((a - 2.0) / (2.0 * alpha * beta - a)).sqrt()
    };
    let c = alpha + 1.0 / b;
    let ln4 = 4.0_f64.ln();

    for _ in 0..max_rejections {
        let u1: f64 = rng.sample(Open01);
        let u2: f64 = rng.sample(Open01);
        let v = b * (u1 / (1.0 - u1)).ln();
        let w = alpha * v.exp();

        let accept = a * (a / (beta + w)).ln() + c * v - ln4 >= (u1 * u1 * u2).ln();
        if accept {
            let x = w / (beta + w);
            if x.is_finite() {
                return Ok(x);
            }
        }
    }

    Err(BanditError::NumericalError {
        message: format!(
            "beta({alpha}, {beta}) rejected {max_rejections} proposals in a row"
        ),
    })
}

/// A seeded source of Beta variates.
#[derive(Clone, Debug)]
pub struct BetaSampler {
    rng: StrategyRng,
}

impl BetaSampler {
    /// Creates a sampler with a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StrategyRng::seed_from_u64(seed),
        }
    }

    /// Draws the next `x ~ Beta(alpha, beta)`.
    pub fn next_beta(&mut self, alpha: f64, beta: f64) -> Result<f64> {
        sample_beta(alpha, beta, &mut self.rng)
    }
}
