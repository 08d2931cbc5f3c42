//! Banditry: a Rust library for multi-armed bandit arm selection.
//!
//! Strategies keep per-arm pull counts and mean rewards, pick the next arm to
//! try, and learn from the rewards they are told about. A strategy can also be
//! fed statistics computed elsewhere, either from a background snapshot
//! stream ([`DelayedStrategy`]) or in batches ([`SimulatedDelayedStrategy`]).
//! The [`sim`] module evaluates strategies with Monte Carlo runs.
//!
//! # Quick Start
//!
//! ```
//! use banditry::prelude::*;
//!
//! // Build a strategy by name over three arms
//! let strategy = new_strategy("epsilon-greedy", 3, &[0.1]).unwrap();
//!
//! // Arms are 1-indexed
//! let arm = strategy.select_arm().unwrap();
//! strategy.update(arm, 1.0).unwrap();
//! assert_eq!(strategy.counters().total_pulls(), 1);
//!
//! // Evaluate against simulated Bernoulli arms
//! let arms = ArmSpec::bernoullis(&[0.1, 0.3, 0.2, 0.8]);
//! let simulation = MonteCarlo::new(20, 50)
//!     .with_seed(7)
//!     .run(|seed| StrategyConfig::new("softmax", &[0.1]).build_seeded(4, seed), &arms)
//!     .unwrap();
//! let accuracy = simulation.accuracy(&ArmSpec::best_arms(&arms));
//! assert_eq!(accuracy.len(), 50);
//! ```

pub mod beta;
mod counters;
mod delayed;
mod error;
mod registry;
pub mod sim;
mod simulated;
pub mod snapshot;
pub mod strategies;

pub use counters::{Counters, Snapshot, StrategyRng};
pub use delayed::{DelayedConfig, DelayedStrategy};
pub use error::{BanditError, Result};
pub use registry::{AnyStrategy, StrategyBuilder, StrategyConfig, StrategyKind, new_strategy};
pub use simulated::SimulatedDelayedStrategy;
pub use strategies::Strategy;

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use banditry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::sim::{ArmSpec, MonteCarlo, Simulation};
    pub use crate::strategies::{EpsilonGreedy, Softmax, Strategy, Thompson, Ucb1, Uniform};
    pub use crate::{
        AnyStrategy, BanditError, Counters, DelayedStrategy, Result, SimulatedDelayedStrategy,
        Snapshot, StrategyBuilder, StrategyConfig, new_strategy,
    };
}
