use std::fmt;

use super::{Strategy, argmax_random_tie};
use crate::counters::{Counters, Snapshot};
use crate::error::Result;

/// Upper Confidence Bound (UCB1) strategy
///
/// Pulls every arm once in ascending order, then selects the arm with the
/// highest `value + sqrt(2 ln(total pulls) / pulls)`. A snapshot without
/// pull counts puts every arm back into the warm-up.
#[derive(Debug)]
pub struct Ucb1 {
    counters: Counters,
}

impl Ucb1 {
    /// Creates a new UCB1 strategy
    pub fn new(arms: usize) -> Self {
        Self {
            counters: Counters::new(arms),
        }
    }

    /// Creates a new UCB1 strategy with a fixed seed for tie-breaking
    pub fn with_seed(arms: usize, seed: u64) -> Self {
        Self {
            counters: Counters::with_seed(arms, seed),
        }
    }

    /// Confidence bound of every arm; unpulled arms score infinity
    pub fn scores(&self) -> Vec<f64> {
        self.counters
            .with_state(|counts, values, _| ucb_scores(counts, values))
    }
}

fn ucb_scores(counts: &[u64], values: &[f64]) -> Vec<f64> {
    let total = counts.iter().sum::<u64>() as f64;
    counts
        .iter()
        .zip(values)
        .map(|(&count, &value)| {
            if count == 0 {
                f64::INFINITY
            } else {
                value + (2.0 * total.ln() / count as f64).sqrt()
            }
        })
        .collect()
}

impl fmt::Display for Ucb1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UCB1")
    }
}

impl Strategy for Ucb1 {
    fn select_arm(&self) -> Result<usize> {
        let index = self.counters.with_state(|counts, values, rng| {
            match counts.iter().position(|&count| count == 0) {
                Some(unpulled) => Ok(unpulled),
                None => argmax_random_tie(&ucb_scores(counts, values), rng),
            }
        })?;
        Ok(index + 1)
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.counts.is_none() {
            tracing::warn!(strategy = %self, "Snapshot has no pull counts, restarting warm-up");
        }
        self.counters.init(snapshot)
    }

    fn counters(&self) -> &Counters {
        &self.counters
    }
}
