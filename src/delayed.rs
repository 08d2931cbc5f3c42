//! Strategy wrapper whose statistics are replaced from outside.
//!
//! A [`DelayedStrategy`] never learns from its own `update` calls. Instead a
//! background task applies snapshots computed elsewhere (a batch job writing a
//! file, another service) to the wrapped strategy as they arrive.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::counters::{Counters, Snapshot};
use crate::error::{BanditError, Result};
use crate::snapshot::SnapshotSource;
use crate::strategies::Strategy;

/// Refresh settings for [`DelayedStrategy::from_source`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayedConfig {
    /// Time between two fetches from the source
    pub poll_interval: Duration,
}

impl Default for DelayedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Wraps a strategy and refreshes its counters from a snapshot stream.
///
/// Selection is delegated to the inner strategy. `update` is a no-op apart
/// from validating the arm. Snapshots are applied one at a time under a lock
/// that `init` and `reset` also take, so the three never interleave.
///
/// The refresh tasks run on the tokio runtime the wrapper was built in. Call
/// [`shutdown`](Self::shutdown) to stop them cleanly; dropping the wrapper
/// aborts them.
pub struct DelayedStrategy<S: ?Sized> {
    inner: Arc<S>,
    lock: Arc<Mutex<()>>,
    applied: Arc<AtomicU64>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: Strategy + ?Sized + 'static> DelayedStrategy<S> {
    /// Applies every snapshot received on `receiver` to `inner`.
    ///
    /// Errors received on the channel are logged and skipped. Fails with
    /// [`BanditError::NoRuntime`] outside a tokio runtime.
    pub fn new(inner: Arc<S>, receiver: mpsc::Receiver<Result<Snapshot>>) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| BanditError::NoRuntime)?;
        let delayed = Self::unstarted(inner);
        delayed.spawn_consumer(&handle, receiver);
        Ok(delayed)
    }

    /// Fetches one snapshot from `source` and applies it, then keeps polling
    /// the source every `config.poll_interval`.
    ///
    /// A failing first fetch fails construction; later failures are logged and
    /// the last good snapshot stays in effect.
    pub fn from_source<Src>(inner: Arc<S>, source: Src, config: DelayedConfig) -> Result<Self>
    where
        Src: SnapshotSource + 'static,
    {
        if config.poll_interval.is_zero() {
            return Err(BanditError::InvalidParameter {
                message: "poll interval must be positive".to_string(),
            });
        }
        let handle = Handle::try_current().map_err(|_| BanditError::NoRuntime)?;

        let initial = source.fetch()?;
        let delayed = Self::unstarted(inner);
        delayed.apply(initial)?;

        let (tx, rx) = mpsc::channel(1);
        delayed.spawn_consumer(&handle, rx);

        let source = Arc::new(source);
        let period = config.poll_interval;
        let poller = handle.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    _ = interval.tick() => {
                        let source = Arc::clone(&source);
                        let fetched = match tokio::task::spawn_blocking(move || source.fetch()).await {
                            Ok(fetched) => fetched,
                            Err(e) => {
                                tracing::warn!(error = %e, "Snapshot fetch task failed");
                                continue;
                            }
                        };
                        if tx.send(fetched).await.is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Snapshot poller stopped");
        });
        delayed.tasks.lock().push(poller);

        Ok(delayed)
    }

    fn unstarted(inner: Arc<S>) -> Self {
        Self {
            inner,
            lock: Arc::new(Mutex::new(())),
            applied: Arc::new(AtomicU64::new(0)),
            shutdown_tx: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn apply(&self, snapshot: Snapshot) -> Result<()> {
        apply_snapshot(&*self.inner, &self.lock, &self.applied, &snapshot)
    }

    fn spawn_consumer(&self, handle: &Handle, mut receiver: mpsc::Receiver<Result<Snapshot>>) {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let lock = Arc::clone(&self.lock);
        let applied = Arc::clone(&self.applied);

        let consumer = handle.spawn(async move {
            tracing::info!(strategy = %inner, "Delayed refresh started");
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    received = receiver.recv() => match received {
                        Some(Ok(snapshot)) => {
                            if let Err(e) = apply_snapshot(&*inner, &lock, &applied, &snapshot) {
                                tracing::warn!(error = %e, "Skipping snapshot");
                            }
                        }
                        Some(Err(e)) => tracing::warn!(error = %e, "Skipping failed snapshot fetch"),
                        None => break,
                    },
                }
            }
            tracing::info!(strategy = %inner, "Delayed refresh stopped");
        });

        *self.shutdown_tx.lock() = Some(shutdown_tx);
        self.tasks.lock().push(consumer);
    }

    /// Shared handle to the wrapped strategy.
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Number of snapshots applied so far.
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Acquire)
    }

    /// Stops the refresh tasks and waits for them to finish.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Refresh task ended abnormally");
            }
        }
    }
}

fn apply_snapshot<S: Strategy + ?Sized>(
    inner: &S,
    lock: &Mutex<()>,
    applied: &AtomicU64,
    snapshot: &Snapshot,
) -> Result<()> {
    let _guard = lock.lock();
    inner.init(snapshot)?;
    let n = applied.fetch_add(1, Ordering::AcqRel) + 1;
    tracing::debug!(applied = n, arms = snapshot.arms, "Applied snapshot");
    Ok(())
}

impl<S: ?Sized> Drop for DelayedStrategy<S> {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

impl<S: Strategy + ?Sized> fmt::Display for DelayedStrategy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delayed({})", self.inner)
    }
}

impl<S: Strategy + ?Sized> fmt::Debug for DelayedStrategy<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelayedStrategy")
            .field("inner", &self.inner.to_string())
            .field("applied", &self.applied.load(Ordering::Relaxed))
            .finish()
    }
}

impl<S: Strategy + ?Sized> Strategy for DelayedStrategy<S> {
    fn select_arm(&self) -> Result<usize> {
        self.inner.select_arm()
    }

    fn counters(&self) -> &Counters {
        self.inner.counters()
    }

    fn update(&self, arm: usize, _reward: f64) -> Result<()> {
        self.inner.counters().index(arm).map(|_| ())
    }

    fn init(&self, snapshot: &Snapshot) -> Result<()> {
        let _guard = self.lock.lock();
        self.inner.init(snapshot)
    }

    fn reset(&self) {
        let _guard = self.lock.lock();
        self.inner.reset();
    }
}
