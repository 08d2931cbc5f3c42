//! Monte Carlo evaluation of strategies against simulated arms.

pub mod arm;
pub mod metrics;
mod monte_carlo;

pub use arm::{Arm, ArmSpec, Bernoulli, Constant, Gaussian};
pub use metrics::{accuracy, cumulative, performance};
pub use monte_carlo::{MonteCarlo, Simulation, monte_carlo};
