//! Per-arm learned statistics shared by every strategy.
//!
//! `Counters` is the only mutable state a strategy owns. Arms are addressed
//! 1-indexed at the API boundary and stored 0-indexed.

use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::{BanditError, Result};

/// Random source owned by every `Counters` instance.
pub type StrategyRng = Xoshiro256PlusPlus;

#[derive(Clone, Debug, Default, PartialEq)]
struct Stats {
    counts: Vec<u64>,
    values: Vec<f64>,
}

impl Stats {
    fn zeroed(arms: usize) -> Self {
        Self {
            counts: vec![0; arms],
            values: vec![0.0; arms],
        }
    }
}

/// Pull counts, running mean rewards and a seeded generator for a fixed set of arms.
///
/// All mutation is serialized through an internal lock, so a `Counters` can be
/// shared between threads behind `&self`.
pub struct Counters {
    arms: usize,
    stats: RwLock<Stats>,
    rng: Mutex<StrategyRng>,
}

impl std::fmt::Debug for Counters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats.read();
        f.debug_struct("Counters")
            .field("arms", &self.arms)
            .field("counts", &stats.counts)
            .field("values", &stats.values)
            .finish()
    }
}

impl Counters {
    /// Creates zeroed counters seeded from the thread-local generator.
    pub fn new(arms: usize) -> Self {
        Self::with_seed(arms, rand::random())
    }

    /// Creates zeroed counters with a fixed seed (reproducible).
    pub fn with_seed(arms: usize, seed: u64) -> Self {
        Self {
            arms,
            stats: RwLock::new(Stats::zeroed(arms)),
            rng: Mutex::new(StrategyRng::seed_from_u64(seed)),
        }
    }

    /// Number of arms.
    pub fn arms(&self) -> usize {
        self.arms
    }

    /// Records one pull of `arm` (1-indexed) with the observed `reward`.
    ///
    /// The pull count is incremented here and only here.
    pub fn update(&self, arm: usize, reward: f64) -> Result<()> {
        let i = self.index(arm)?;
        let mut stats = self.stats.write();
        stats.counts[i] += 1;
        let count = stats.counts[i] as f64;
        stats.values[i] = (stats.values[i] * (count - 1.0) + reward) / count;
        Ok(())
    }

    /// Replaces counts and values (and the generator, if seeded) from `snapshot`.
    pub fn init(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.arms == 0 {
            return Err(BanditError::EmptySnapshot);
        }
        if snapshot.arms != self.arms {
            return Err(BanditError::ArmCountMismatch {
                expected: self.arms,
                got: snapshot.arms,
            });
        }
        snapshot.validate()?;

        let counts = snapshot
            .counts
            .clone()
            .unwrap_or_else(|| vec![0; snapshot.arms]);

        let mut stats = self.stats.write();
        stats.counts = counts;
        stats.values = snapshot.values.clone();
        if let Some(seed) = snapshot.seed {
            *self.rng.lock() = StrategyRng::seed_from_u64(seed);
        }
        Ok(())
    }

    /// Zeroes counts and values. The arm count and generator are preserved.
    pub fn reset(&self) {
        *self.stats.write() = Stats::zeroed(self.arms);
    }

    /// Copies the current statistics into a snapshot, pull counts included.
    pub fn snapshot(&self) -> Snapshot {
        let stats = self.stats.read();
        Snapshot {
            arms: self.arms,
            values: stats.values.clone(),
            counts: Some(stats.counts.clone()),
            seed: None,
        }
    }

    /// Per-arm pull counts.
    pub fn counts(&self) -> Vec<u64> {
        self.stats.read().counts.clone()
    }

    /// Per-arm running mean rewards.
    pub fn values(&self) -> Vec<f64> {
        self.stats.read().values.clone()
    }

    /// Sum of all pull counts.
    pub fn total_pulls(&self) -> u64 {
        self.stats.read().counts.iter().sum()
    }

    /// Converts a 1-indexed arm into a storage index.
    pub(crate) fn index(&self, arm: usize) -> Result<usize> {
        if arm == 0 || arm > self.arms {
            return Err(BanditError::ArmOutOfRange {
                arm,
                arms: self.arms,
            });
        }
        Ok(arm - 1)
    }

    /// Runs `f` with a consistent view of counts and values and the generator.
    ///
    /// Lock order is stats, then generator; `init` follows the same order.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&[u64], &[f64], &mut StrategyRng) -> T) -> T {
        let stats = self.stats.read();
        let mut rng = self.rng.lock();
        f(&stats.counts, &stats.values, &mut rng)
    }
}

/// Serializable value form of [`Counters`].
///
/// Arm cardinality and per-arm mean rewards are always present. Pull counts
/// are optional and default to zero when applied. A seed, when present,
/// replaces the receiving generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub arms: usize,
    pub values: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Snapshot {
    /// Snapshot carrying mean rewards only.
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            arms: values.len(),
            values,
            counts: None,
            seed: None,
        }
    }

    /// Snapshot carrying mean rewards and pull counts.
    pub fn with_counts(values: Vec<f64>, counts: Vec<u64>) -> Result<Self> {
        let snapshot = Self {
            arms: values.len(),
            values,
            counts: Some(counts),
            seed: None,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Sets the generator seed applied on `init`.
    #[must_use]
    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Aggregates `(arm, reward)` observations (1-indexed arms) with the
    /// running-mean rule used by [`Counters::update`].
    pub fn from_observations<I>(arms: usize, observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        if arms == 0 {
            return Err(BanditError::EmptySnapshot);
        }
        let counters = Counters::with_seed(arms, 0);
        for (arm, reward) in observations {
            counters.update(arm, reward)?;
        }
        Ok(counters.snapshot())
    }

    /// Checks that the per-arm vectors agree with `arms`.
    pub fn validate(&self) -> Result<()> {
        if self.values.len() != self.arms {
            return Err(BanditError::InvalidSnapshot {
                message: format!("{} arms but {} values", self.arms, self.values.len()),
            });
        }
        if let Some(counts) = &self.counts {
            if counts.len() != self.arms {
                return Err(BanditError::InvalidSnapshot {
                    message: format!("{} arms but {} counts", self.arms, counts.len()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_counters_are_zeroed() {
        let counters = Counters::with_seed(3, 42);
        assert_eq!(counters.arms(), 3);
        assert_eq!(counters.counts(), vec![0, 0, 0]);
        assert_eq!(counters.values(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_update_running_mean() {
        let counters = Counters::with_seed(2, 42);
        counters.update(1, 1.0).unwrap();
        counters.update(1, 0.0).unwrap();
        counters.update(1, 0.5).unwrap();
        counters.update(2, 0.7).unwrap();

        assert_eq!(counters.counts(), vec![3, 1]);
        assert_abs_diff_eq!(counters.values()[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(counters.values()[1], 0.7, epsilon = 1e-12);
        assert_eq!(counters.total_pulls(), 4);
    }

    #[test]
    fn test_update_rejects_out_of_range_arms() {
        let counters = Counters::with_seed(2, 42);
        assert!(matches!(
            counters.update(0, 1.0),
            Err(BanditError::ArmOutOfRange { arm: 0, arms: 2 })
        ));
        assert!(matches!(
            counters.update(3, 1.0),
            Err(BanditError::ArmOutOfRange { arm: 3, arms: 2 })
        ));
        assert_eq!(counters.total_pulls(), 0);
    }

    #[test]
    fn test_init_replaces_state() {
        let counters = Counters::with_seed(2, 42);
        counters.update(1, 1.0).unwrap();

        let snapshot = Snapshot::with_counts(vec![0.25, 0.75], vec![4, 8]).unwrap();
        counters.init(&snapshot).unwrap();
        assert_eq!(counters.counts(), vec![4, 8]);
        assert_eq!(counters.values(), vec![0.25, 0.75]);

        counters.init(&Snapshot::new(vec![0.1, 0.2])).unwrap();
        assert_eq!(counters.counts(), vec![0, 0]);
        assert_eq!(counters.values(), vec![0.1, 0.2]);
    }

    #[test]
    fn test_init_rejects_bad_snapshots() {
        let counters = Counters::with_seed(2, 42);
        counters.update(2, 1.0).unwrap();

        assert!(matches!(
            counters.init(&Snapshot::new(vec![0.1, 0.2, 0.3])),
            Err(BanditError::ArmCountMismatch {
                expected: 2,
                got: 3
            })
        ));
        assert!(matches!(
            counters.init(&Snapshot::new(vec![])),
            Err(BanditError::EmptySnapshot)
        ));

        let ragged = Snapshot {
            arms: 2,
            values: vec![0.1],
            counts: None,
            seed: None,
        };
        assert!(matches!(
            counters.init(&ragged),
            Err(BanditError::InvalidSnapshot { .. })
        ));

        // failed inits leave the previous state in place
        assert_eq!(counters.counts(), vec![0, 1]);
        assert_eq!(counters.values(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_seeded_init_replaces_generator() {
        let a = Counters::with_seed(2, 1);
        let b = Counters::with_seed(2, 2);
        let snapshot = Snapshot::new(vec![0.0, 0.0]).seeded(7);
        a.init(&snapshot).unwrap();
        b.init(&snapshot).unwrap();

        use rand::Rng;
        let xa: u64 = a.with_state(|_, _, rng| rng.random());
        let xb: u64 = b.with_state(|_, _, rng| rng.random());
        assert_eq!(xa, xb);
    }

    #[test]
    fn test_reset_preserves_arms() {
        let counters = Counters::with_seed(4, 42);
        counters.update(3, 2.0).unwrap();
        counters.reset();
        assert_eq!(counters.arms(), 4);
        assert_eq!(counters.counts(), vec![0; 4]);
        assert_eq!(counters.values(), vec![0.0; 4]);
    }

    #[test]
    fn test_snapshot_from_observations() {
        let snapshot = Snapshot::from_observations(2, [(2, 1.0), (2, 0.0)]).unwrap();
        assert_eq!(snapshot.arms, 2);
        assert_eq!(snapshot.values, vec![0.0, 0.5]);
        assert_eq!(snapshot.counts, Some(vec![0, 2]));

        assert!(Snapshot::from_observations(2, [(3, 1.0)]).is_err());
        assert!(Snapshot::from_observations(0, []).is_err());
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        use std::sync::Arc;

        let counters = Arc::new(Counters::with_seed(3, 42));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for i in 0..1000 {
                        counters.update((t + i) % 3 + 1, 1.0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counters.total_pulls(), 4000);
        for value in counters.values() {
            assert_abs_diff_eq!(value, 1.0, epsilon = 1e-12);
        }
    }
}
