use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::arm::{Arm, ArmSpec};
use crate::counters::StrategyRng;
use crate::error::{BanditError, Result};
use crate::strategies::Strategy;

/// Flat record of a Monte Carlo run.
///
/// Every column has `sims * trials` entries; the row of simulation `s` and
/// trial `t` (both 0-based) is `s * trials + t`. The `sim` and `trial`
/// columns store 1-based numbers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub sims: usize,
    pub trials: usize,
    pub description: String,
    pub sim: Vec<usize>,
    pub trial: Vec<usize>,
    pub selected: Vec<usize>,
    pub reward: Vec<f64>,
    pub cumulative: Vec<f64>,
}

impl Simulation {
    fn with_capacity(sims: usize, trials: usize, description: String) -> Self {
        let rows = sims * trials;
        Self {
            sims,
            trials,
            description,
            sim: Vec::with_capacity(rows),
            trial: Vec::with_capacity(rows),
            selected: Vec::with_capacity(rows),
            reward: Vec::with_capacity(rows),
            cumulative: Vec::with_capacity(rows),
        }
    }

    fn push_run(&mut self, sim: usize, run: &Run) {
        for (t, &(selected, reward, cumulative)) in run.iter().enumerate() {
            self.sim.push(sim + 1);
            self.trial.push(t + 1);
            self.selected.push(selected);
            self.reward.push(reward);
            self.cumulative.push(cumulative);
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }
}

/// Seeds for the arm generators of one simulation, taken from `seed`'s
/// stream after one jump (2^128 draws ahead).
fn arm_seeds(seed: u64, arms: usize) -> Vec<u64> {
    let mut rng = StrategyRng::seed_from_u64(seed);
    rng.jump();
    (0..arms).map(|_| rng.random()).collect()
}

/// `(selected, reward, cumulative)` for every trial of one simulation.
type Run = Vec<(usize, f64, f64)>;

fn check_shape(sims: usize, trials: usize, arms: usize) -> Result<()> {
    if sims == 0 || trials == 0 {
        return Err(BanditError::InvalidParameter {
            message: format!("need at least one simulation and trial, got {sims} x {trials}"),
        });
    }
    if arms == 0 {
        return Err(BanditError::NoArmsAvailable);
    }
    Ok(())
}

fn play<S: Strategy + ?Sized>(
    strategy: &S,
    trials: usize,
    arms: &mut [Box<dyn Arm>],
) -> Result<Run> {
    if strategy.arms() != arms.len() {
        return Err(BanditError::ArmCountMismatch {
            expected: arms.len(),
            got: strategy.arms(),
        });
    }

    let mut run = Vec::with_capacity(trials);
    let mut cumulative = 0.0;
    for _ in 0..trials {
        let selected = strategy.select_arm()?;
        if selected == 0 || selected > arms.len() {
            return Err(BanditError::ArmOutOfRange {
                arm: selected,
                arms: arms.len(),
            });
        }
        let reward = arms[selected - 1].pull();
        strategy.update(selected, reward)?;
        cumulative += reward;
        run.push((selected, reward, cumulative));
    }
    Ok(run)
}

/// Runs `sims` independent simulations of `trials` pulls each, one after the
/// other.
///
/// `new_strategy` is called once per simulation. The generators in `arms` are
/// shared by all simulations and keep their state between them.
pub fn monte_carlo<S, F>(
    sims: usize,
    trials: usize,
    mut new_strategy: F,
    arms: &mut [Box<dyn Arm>],
) -> Result<Simulation>
where
    S: Strategy,
    F: FnMut() -> Result<S>,
{
    check_shape(sims, trials, arms.len())?;

    let mut simulation = None;
    for s in 0..sims {
        let strategy = new_strategy()?;
        let run = play(&strategy, trials, arms)?;
        simulation
            .get_or_insert_with(|| Simulation::with_capacity(sims, trials, strategy.to_string()))
            .push_run(s, &run);
    }

    let simulation = simulation.unwrap_or_default();
    tracing::debug!(
        sims,
        trials,
        strategy = %simulation.description,
        "Monte Carlo run finished"
    );
    Ok(simulation)
}

/// Seeded, parallel Monte Carlo runner.
///
/// Simulation `s` receives seed `seed + s` for its strategy. Its arm
/// generators are seeded from a jumped stream of the same seed, so they never
/// replay the strategy's draws, and a run is reproducible no matter how rayon
/// schedules it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarlo {
    pub sims: usize,
    pub trials: usize,
    pub seed: u64,
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self {
            sims: 5000,
            trials: 300,
            seed: 0,
        }
    }
}

impl MonteCarlo {
    pub fn new(sims: usize, trials: usize) -> Self {
        Self {
            sims,
            trials,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Runs every simulation on the rayon pool.
    pub fn run<S, F>(&self, new_strategy: F, arms: &[ArmSpec]) -> Result<Simulation>
    where
        S: Strategy,
        F: Fn(u64) -> Result<S> + Sync,
    {
        check_shape(self.sims, self.trials, arms.len())?;

        let runs = (0..self.sims)
            .into_par_iter()
            .map(|s| {
                let seed = self.seed.wrapping_add(s as u64);
                let strategy = new_strategy(seed)?;

                let mut generators = arms
                    .iter()
                    .zip(arm_seeds(seed, arms.len()))
                    .map(|(spec, arm_seed)| spec.build(arm_seed))
                    .collect::<Result<Vec<_>>>()?;

                let run = play(&strategy, self.trials, &mut generators)?;
                Ok((strategy.to_string(), run))
            })
            .collect::<Result<Vec<_>>>()?;

        let description = runs
            .first()
            .map(|(description, _)| description.clone())
            .unwrap_or_default();
        let mut simulation = Simulation::with_capacity(self.sims, self.trials, description);
        for (s, (_, run)) in runs.iter().enumerate() {
            simulation.push_run(s, run);
        }

        tracing::debug!(
            sims = self.sims,
            trials = self.trials,
            seed = self.seed,
            strategy = %simulation.description,
            "Monte Carlo run finished"
        );
        Ok(simulation)
    }
}
