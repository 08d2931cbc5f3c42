//! Per-trial summaries of a [`Simulation`].
//!
//! Each metric returns one value per trial, averaged across simulations.

use super::monte_carlo::Simulation;

fn per_trial_mean(sim: &Simulation, value: impl Fn(usize) -> f64) -> Vec<f64> {
    if sim.sims == 0 {
        return vec![0.0; sim.trials];
    }
    let mut totals = vec![0.0; sim.trials];
    for s in 0..sim.sims {
        for (t, total) in totals.iter_mut().enumerate() {
            *total += value(s * sim.trials + t);
        }
    }
    let sims = sim.sims as f64;
    totals.into_iter().map(|total| total / sims).collect()
}

/// Fraction of simulations that selected one of `best_arms` at each trial.
pub fn accuracy(sim: &Simulation, best_arms: &[usize]) -> Vec<f64> {
    per_trial_mean(sim, |row| {
        if best_arms.contains(&sim.selected[row]) {
            1.0
        } else {
            0.0
        }
    })
}

/// Mean reward at each trial.
pub fn performance(sim: &Simulation) -> Vec<f64> {
    per_trial_mean(sim, |row| sim.reward[row])
}

/// Mean cumulative reward at each trial.
pub fn cumulative(sim: &Simulation) -> Vec<f64> {
    per_trial_mean(sim, |row| sim.cumulative[row])
}

impl Simulation {
    pub fn accuracy(&self, best_arms: &[usize]) -> Vec<f64> {
        accuracy(self, best_arms)
    }

    pub fn performance(&self) -> Vec<f64> {
        performance(self)
    }

    pub fn cumulative(&self) -> Vec<f64> {
        cumulative(self)
    }
}
