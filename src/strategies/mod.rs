mod epsilon_greedy;
mod softmax;
mod thompson;
mod ucb;
mod uniform;

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::counters::{Counters, Snapshot};
use crate::error::{BanditError, Result};

pub use epsilon_greedy::EpsilonGreedy;
pub use softmax::{Softmax, softmax_probabilities};
pub use thompson::Thompson;
pub use ucb::Ucb1;
pub use uniform::Uniform;

/// Core trait for arm selection strategies
///
/// Arms are 1-indexed. Every method takes `&self`: learned state lives in the
/// strategy's [`Counters`], which serializes its own mutation, so one strategy
/// can be shared between concurrent callers. The `Display` impl is the
/// human-readable descriptor, e.g. `Softmax(tau=0.10)`.
pub trait Strategy: Send + Sync + fmt::Display {
    /// Select the 1-indexed arm to try next
    fn select_arm(&self) -> Result<usize>;

    /// The statistics this strategy selects from
    fn counters(&self) -> &Counters;

    /// Record the reward observed after pulling `arm`
    fn update(&self, arm: usize, reward: f64) -> Result<()> {
        self.counters().update(arm, reward)
    }

    /// Replace learned statistics with an externally computed snapshot
    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        self.counters().init(snapshot)
    }

    /// Return to the zero state; configuration and arm count are kept
    fn reset(&self) {
        self.counters().reset();
    }

    /// Number of arms
    fn arms(&self) -> usize {
        self.counters().arms()
    }
}

impl<S: Strategy + ?Sized> Strategy for Box<S> {
    fn select_arm(&self) -> Result<usize> {
        (**self).select_arm()
    }

    fn counters(&self) -> &Counters {
        (**self).counters()
    }

    fn update(&self, arm: usize, reward: f64) -> Result<()> {
        (**self).update(arm, reward)
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).init(snapshot)
    }

    fn reset(&self) {
        (**self).reset()
    }
}

impl<S: Strategy + ?Sized> Strategy for Arc<S> {
    fn select_arm(&self) -> Result<usize> {
        (**self).select_arm()
    }

    fn counters(&self) -> &Counters {
        (**self).counters()
    }

    fn update(&self, arm: usize, reward: f64) -> Result<()> {
        (**self).update(arm, reward)
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).init(snapshot)
    }

    fn reset(&self) {
        (**self).reset()
    }
}

/// Indices of every element equal to the maximum of `scores`.
pub(crate) fn argmax_all(scores: &[f64]) -> Vec<usize> {
    let mut best = f64::NEG_INFINITY;
    let mut indices = Vec::new();
    for (i, &score) in scores.iter().enumerate() {
        if score > best {
            best = score;
            indices.clear();
            indices.push(i);
        } else if score == best {
            indices.push(i);
        }
    }
    indices
}

/// Argmax of `scores` with ties broken uniformly at random.
///
/// Falls back to a uniform pick when no score is comparable (all NaN).
pub(crate) fn argmax_random_tie<R: Rng + ?Sized>(scores: &[f64], rng: &mut R) -> Result<usize> {
    let best = argmax_all(scores);
    if best.is_empty() {
        return uniform_index(scores.len(), rng);
    }
    Ok(best[rng.random_range(0..best.len())])
}

/// Uniform index in `0..arms`.
pub(crate) fn uniform_index<R: Rng + ?Sized>(arms: usize, rng: &mut R) -> Result<usize> {
    if arms == 0 {
        return Err(BanditError::NoArmsAvailable);
    }
    Ok(rng.random_range(0..arms))
}

/// Rejects an empty arm set at construction.
pub(crate) fn require_arms(arms: usize) -> Result<()> {
    if arms == 0 {
        return Err(BanditError::NoArmsAvailable);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_argmax_all_collects_ties() {
        assert_eq!(argmax_all(&[0.1, 0.5, 0.5, 0.2]), vec![1, 2]);
        assert_eq!(argmax_all(&[-3.0, -1.0, -2.0]), vec![1]);
        assert_eq!(argmax_all(&[0.0, 0.0]), vec![0, 1]);
    }

    #[test]
    fn test_argmax_random_tie_visits_all_maximizers() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let scores = [1.0, 0.0, 1.0, 1.0];
        let seen: HashSet<usize> = (0..200)
            .map(|_| argmax_random_tie(&scores, &mut rng).unwrap())
            .collect();
        assert_eq!(seen, HashSet::from([0, 2, 3]));
    }

    #[test]
    fn test_empty_scores_are_an_error() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        assert!(matches!(
            argmax_random_tie(&[], &mut rng),
            Err(BanditError::NoArmsAvailable)
        ));
        assert!(matches!(
            uniform_index(0, &mut rng),
            Err(BanditError::NoArmsAvailable)
        ));
        // all NaN falls back to a uniform pick
        assert!(argmax_random_tie(&[f64::NAN, f64::NAN], &mut rng).unwrap() < 2);
    }

    #[test]
    fn test_boxed_strategy_forwards() {
        let strategy: Box<dyn Strategy> = Box::new(Ucb1::with_seed(2, 42));
        assert_eq!(strategy.arms(), 2);
        assert_eq!(strategy.select_arm().unwrap(), 1);
        strategy.update(1, 1.0).unwrap();
        assert_eq!(strategy.counters().counts(), vec![1, 0]);
        assert_eq!(strategy.to_string(), "UCB1");
    }
}
