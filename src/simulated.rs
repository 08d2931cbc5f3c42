use std::fmt;

use parking_lot::Mutex;

use crate::counters::{Counters, Snapshot};
use crate::error::{BanditError, Result};
use crate::strategies::Strategy;

/// Delayed feedback without any I/O, for simulations
///
/// Rewards are accumulated into local counters and pushed to the inner
/// strategy with `init` once every `limit` updates. The local counters keep
/// the full history, so each flush hands the inner strategy everything seen so
/// far. With `limit == 1` this behaves exactly like the inner strategy.
#[derive(Debug)]
pub struct SimulatedDelayedStrategy<S> {
    inner: S,
    local: Counters,
    limit: usize,
    pending: Mutex<usize>,
}

impl<S: Strategy> SimulatedDelayedStrategy<S> {
    /// Wraps `inner`, flushing every `limit` updates
    pub fn new(inner: S, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(BanditError::InvalidParameter {
                message: "update limit must be at least 1".to_string(),
            });
        }
        let local = Counters::with_seed(inner.arms(), 0);
        Ok(Self {
            inner,
            local,
            limit,
            pending: Mutex::new(0),
        })
    }

    /// Gets the flush interval
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The wrapped strategy
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Statistics gathered so far, flushed or not
    pub fn local(&self) -> &Counters {
        &self.local
    }

    /// Updates recorded since the last flush
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }
}

impl<S: Strategy> fmt::Display for SimulatedDelayedStrategy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimulatedDelayed(limit={}, {})", self.limit, self.inner)
    }
}

impl<S: Strategy> Strategy for SimulatedDelayedStrategy<S> {
    fn select_arm(&self) -> Result<usize> {
        self.inner.select_arm()
    }

    /// The statistics selection currently sees
    fn counters(&self) -> &Counters {
        self.inner.counters()
    }

    fn update(&self, arm: usize, reward: f64) -> Result<()> {
        let mut pending = self.pending.lock();
        self.local.update(arm, reward)?;
        *pending += 1;
        if *pending >= self.limit {
            self.inner.init(&self.local.snapshot())?;
            *pending = 0;
        }
        Ok(())
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        let mut pending = self.pending.lock();
        self.local.init(snapshot)?;
        self.inner.init(snapshot)?;
        *pending = 0;
        Ok(())
    }

    fn reset(&self) {
        let mut pending = self.pending.lock();
        self.local.reset();
        self.inner.reset();
        *pending = 0;
    }
}
