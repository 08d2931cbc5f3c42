//! Construct strategies by name.
//!
//! The registry is the factory the rest of an application talks to: a
//! strategy name, an arm count and an ordered parameter list go in, a
//! validated [`AnyStrategy`] comes out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::counters::{Counters, Snapshot};
use crate::error::{BanditError, Result};
use crate::strategies::{EpsilonGreedy, Softmax, Strategy, Thompson, Ucb1, Uniform};

/// The strategy families known to the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    EpsilonGreedy,
    Softmax,
    Ucb1,
    Thompson,
    Uniform,
}

impl StrategyKind {
    /// Canonical registry name.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::EpsilonGreedy => "epsilon-greedy",
            StrategyKind::Softmax => "softmax",
            StrategyKind::Ucb1 => "ucb1",
            StrategyKind::Thompson => "thompson",
            StrategyKind::Uniform => "uniform",
        }
    }

    /// Exact number of hyperparameters this kind takes.
    pub fn parameter_count(self) -> usize {
        match self {
            StrategyKind::EpsilonGreedy | StrategyKind::Softmax | StrategyKind::Thompson => 1,
            StrategyKind::Ucb1 | StrategyKind::Uniform => 0,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = BanditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "epsilon-greedy" | "epsilon_greedy" | "epsilongreedy" => Ok(StrategyKind::EpsilonGreedy),
            "softmax" => Ok(StrategyKind::Softmax),
            "ucb1" | "ucb" => Ok(StrategyKind::Ucb1),
            "thompson" => Ok(StrategyKind::Thompson),
            "uniform" | "random" => Ok(StrategyKind::Uniform),
            _ => Err(BanditError::UnknownStrategy {
                name: s.to_string(),
            }),
        }
    }
}

/// Any registry-built strategy, dispatched statically.
#[derive(Debug)]
pub enum AnyStrategy {
    EpsilonGreedy(EpsilonGreedy),
    Softmax(Softmax),
    Ucb1(Ucb1),
    Thompson(Thompson),
    Uniform(Uniform),
}

impl AnyStrategy {
    /// The family this strategy belongs to.
    pub fn kind(&self) -> StrategyKind {
        match self {
            AnyStrategy::EpsilonGreedy(_) => StrategyKind::EpsilonGreedy,
            AnyStrategy::Softmax(_) => StrategyKind::Softmax,
            AnyStrategy::Ucb1(_) => StrategyKind::Ucb1,
            AnyStrategy::Thompson(_) => StrategyKind::Thompson,
            AnyStrategy::Uniform(_) => StrategyKind::Uniform,
        }
    }
}

impl fmt::Display for AnyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyStrategy::EpsilonGreedy(s) => fmt::Display::fmt(s, f),
            AnyStrategy::Softmax(s) => fmt::Display::fmt(s, f),
            AnyStrategy::Ucb1(s) => fmt::Display::fmt(s, f),
            AnyStrategy::Thompson(s) => fmt::Display::fmt(s, f),
            AnyStrategy::Uniform(s) => fmt::Display::fmt(s, f),
        }
    }
}

impl Strategy for AnyStrategy {
    fn select_arm(&self) -> Result<usize> {
        match self {
            AnyStrategy::EpsilonGreedy(s) => s.select_arm(),
            AnyStrategy::Softmax(s) => s.select_arm(),
            AnyStrategy::Ucb1(s) => s.select_arm(),
            AnyStrategy::Thompson(s) => s.select_arm(),
            AnyStrategy::Uniform(s) => s.select_arm(),
        }
    }

    fn counters(&self) -> &Counters {
        match self {
            AnyStrategy::EpsilonGreedy(s) => s.counters(),
            AnyStrategy::Softmax(s) => s.counters(),
            AnyStrategy::Ucb1(s) => s.counters(),
            AnyStrategy::Thompson(s) => s.counters(),
            AnyStrategy::Uniform(s) => s.counters(),
        }
    }

    fn update(&self, arm: usize, reward: f64) -> Result<()> {
        self.counters().update(arm, reward)
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        match self {
            AnyStrategy::EpsilonGreedy(s) => s.init(snapshot),
            AnyStrategy::Softmax(s) => s.init(snapshot),
            AnyStrategy::Ucb1(s) => s.init(snapshot),
            AnyStrategy::Thompson(s) => s.init(snapshot),
            AnyStrategy::Uniform(s) => s.init(snapshot),
        }
    }

    fn reset(&self) {
        self.counters().reset()
    }
}

/// Builds the named strategy over `arms` arms with entropy seeding.
pub fn new_strategy(name: &str, arms: usize, params: &[f64]) -> Result<AnyStrategy> {
    StrategyBuilder::new(name).arms(arms).params(params).build()
}

/// Builder for creating strategies with a fluent API
#[derive(Clone, Debug, Default)]
pub struct StrategyBuilder {
    name: Option<String>,
    arms: Option<usize>,
    params: Vec<f64>,
    seed: Option<u64>,
}

impl StrategyBuilder {
    /// Start building the named strategy
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set the number of arms
    pub fn arms(mut self, arms: usize) -> Self {
        self.arms = Some(arms);
        self
    }

    /// Set the ordered hyperparameters
    pub fn params(mut self, params: &[f64]) -> Self {
        self.params = params.to_vec();
        self
    }

    /// Seed the strategy's generator for reproducible selection
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the strategy
    pub fn build(self) -> Result<AnyStrategy> {
        let name = self.name.ok_or(BanditError::BuilderError {
            message: "strategy name not specified".into(),
        })?;
        let arms = self.arms.ok_or(BanditError::BuilderError {
            message: "arms not specified".into(),
        })?;

        let kind: StrategyKind = name.parse()?;
        if self.params.len() != kind.parameter_count() {
            return Err(BanditError::ParameterCount {
                strategy: kind.name(),
                expected: kind.parameter_count(),
                got: self.params.len(),
            });
        }
        if arms == 0 {
            return Err(BanditError::NoArmsAvailable);
        }

        let seed = self.seed.unwrap_or_else(rand::random);
        let strategy = match kind {
            StrategyKind::EpsilonGreedy => {
                AnyStrategy::EpsilonGreedy(EpsilonGreedy::with_seed(arms, self.params[0], seed)?)
            }
            StrategyKind::Softmax => {
                AnyStrategy::Softmax(Softmax::with_seed(arms, self.params[0], seed)?)
            }
            StrategyKind::Thompson => {
                AnyStrategy::Thompson(Thompson::with_seed(arms, self.params[0], seed)?)
            }
            StrategyKind::Ucb1 => AnyStrategy::Ucb1(Ucb1::with_seed(arms, seed)),
            StrategyKind::Uniform => AnyStrategy::Uniform(Uniform::with_seed(arms, seed)),
        };

        tracing::debug!(strategy = %strategy, arms, "built strategy");
        Ok(strategy)
    }
}

/// A strategy name plus its ordered hyperparameters.
///
/// Parses from `"<name>"` or `"<name>:<p1>,<p2>,..."`, e.g. `"softmax:0.1"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub params: Vec<f64>,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>, params: &[f64]) -> Self {
        Self {
            name: name.into(),
            params: params.to_vec(),
        }
    }

    /// Builds the configured strategy over `arms` arms.
    pub fn build(&self, arms: usize) -> Result<AnyStrategy> {
        new_strategy(&self.name, arms, &self.params)
    }

    /// Builds the configured strategy with a fixed seed.
    pub fn build_seeded(&self, arms: usize, seed: u64) -> Result<AnyStrategy> {
        StrategyBuilder::new(self.name.as_str())
            .arms(arms)
            .params(&self.params)
            .seed(seed)
            .build()
    }
}

impl FromStr for StrategyConfig {
    type Err = BanditError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, params) = match s.split_once(':') {
            Some((name, params)) => (name, params),
            None => (s, ""),
        };
        let params = params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<f64>().map_err(|e| BanditError::InvalidParameter {
                    message: format!("'{p}' is not a number: {e}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: name.trim().to_string(),
            params,
        })
    }
}

impl fmt::Display for StrategyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            f.write_str(if i == 0 { ":" } else { "," })?;
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_builds_every_kind() {
        let cases: [(&str, &[f64], &str); 5] = [
            ("epsilon-greedy", &[0.1], "EpsilonGreedy(epsilon=0.10)"),
            ("softmax", &[0.2], "Softmax(tau=0.20)"),
            ("ucb1", &[], "UCB1"),
            ("thompson", &[2.0], "Thompson(alpha=2.00)"),
            ("uniform", &[], "Uniform"),
        ];
        for (name, params, descriptor) in cases {
            let strategy = new_strategy(name, 3, params).unwrap();
            assert_eq!(strategy.to_string(), descriptor);
            assert_eq!(strategy.arms(), 3);
            assert_eq!(strategy.kind(), name.parse::<StrategyKind>().unwrap());
        }
    }

    #[test]
    fn test_registry_aliases() {
        assert_eq!(
            "EpsilonGreedy".parse::<StrategyKind>().unwrap(),
            StrategyKind::EpsilonGreedy
        );
        assert_eq!("UCB".parse::<StrategyKind>().unwrap(), StrategyKind::Ucb1);
        assert_eq!("random".parse::<StrategyKind>().unwrap(), StrategyKind::Uniform);
    }

    #[test]
    fn test_registry_rejects_unknown_names() {
        let err = new_strategy("exp3", 2, &[]).unwrap_err();
        assert!(matches!(err, BanditError::UnknownStrategy { name } if name == "exp3"));
    }

    #[test]
    fn test_registry_checks_parameter_counts() {
        assert!(matches!(
            new_strategy("softmax", 2, &[]),
            Err(BanditError::ParameterCount {
                strategy: "softmax",
                expected: 1,
                got: 0
            })
        ));
        assert!(matches!(
            new_strategy("ucb1", 2, &[1.0]),
            Err(BanditError::ParameterCount { expected: 0, got: 1, .. })
        ));
        assert!(matches!(
            new_strategy("epsilon-greedy", 2, &[0.1, 0.2]),
            Err(BanditError::ParameterCount { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn test_registry_checks_ranges_and_arms() {
        assert!(matches!(
            new_strategy("epsilon-greedy", 2, &[1.5]),
            Err(BanditError::InvalidParameter { .. })
        ));
        assert!(matches!(
            new_strategy("softmax", 2, &[-0.1]),
            Err(BanditError::InvalidParameter { .. })
        ));
        assert!(matches!(
            new_strategy("thompson", 2, &[0.0]),
            Err(BanditError::InvalidParameter { .. })
        ));
        assert!(matches!(
            new_strategy("ucb1", 0, &[]),
            Err(BanditError::NoArmsAvailable)
        ));
    }

    #[test]
    fn test_builder_requires_arms() {
        let err = StrategyBuilder::new("ucb1").build().unwrap_err();
        assert!(matches!(err, BanditError::BuilderError { .. }));
        let err = StrategyBuilder::default().arms(2).build().unwrap_err();
        assert!(matches!(err, BanditError::BuilderError { .. }));
    }

    #[test]
    fn test_builder_seed_is_reproducible() {
        let build = || {
            StrategyBuilder::new("epsilon-greedy")
                .arms(5)
                .params(&[1.0])
                .seed(42)
                .build()
                .unwrap()
        };
        let (a, b) = (build(), build());
        for _ in 0..50 {
            assert_eq!(a.select_arm().unwrap(), b.select_arm().unwrap());
        }
    }

    #[test]
    fn test_strategy_config_parsing() {
        let config: StrategyConfig = "softmax:0.1".parse().unwrap();
        assert_eq!(config.name, "softmax");
        assert_eq!(config.params, vec![0.1]);
        assert_eq!(config.to_string(), "softmax:0.1");

        let config: StrategyConfig = "ucb1".parse().unwrap();
        assert!(config.params.is_empty());
        assert_eq!(config.build(4).unwrap().to_string(), "UCB1");

        assert!("softmax:abc".parse::<StrategyConfig>().is_err());
    }

    #[test]
    fn test_strategy_config_deserializes() {
        let config: StrategyConfig =
            serde_json::from_str(r#"{"name": "thompson", "params": [10.0]}"#).unwrap();
        let strategy = config.build_seeded(2, 1).unwrap();
        assert_eq!(strategy.to_string(), "Thompson(alpha=10.00)");

        let config: StrategyConfig = serde_json::from_str(r#"{"name": "uniform"}"#).unwrap();
        assert!(config.params.is_empty());
    }
}
