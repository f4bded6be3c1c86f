//! Fixed-interval cycle loop.
//!
//! Each cycle runs to completion, then the loop sleeps for the interval and
//! starts the next one. Cycles run as their own tokio task so a panic or an
//! error ends that cycle only; the loop logs it and carries on.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// "One in flight" marker shared between the scheduler and shutdown.
///
/// A cycle holds the permit for its whole lifetime, including the page it
/// opened. A cycle that cannot get the permit is skipped.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard(Arc<Mutex<()>>);

impl CycleGuard {
    /// Take the permit if no cycle is running.
    #[must_use]
    pub fn try_begin(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.0).try_lock_owned().ok()
    }

    /// Wait until the running cycle (if any) has released the permit.
    pub async fn wait_idle(&self) {
        drop(self.0.lock().await);
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0.try_lock().is_err()
    }
}

pub struct CycleScheduler {
    interval: Duration,
    guard: CycleGuard,
}

impl CycleScheduler {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            guard: CycleGuard::default(),
        }
    }

    #[must_use]
    pub fn guard(&self) -> CycleGuard {
        self.guard.clone()
    }

    /// Run `unit_of_work` forever: run a cycle, wait `interval`, repeat.
    ///
    /// Never returns; drop the future to stop the loop. A cycle already
    /// spawned keeps running until it finishes and holds the [`CycleGuard`]
    /// until then.
    pub async fn run<F, Fut>(&self, mut unit_of_work: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            self.run_one(cycle, unit_of_work()).await;
            tracing::debug!(
                cycle,
                sleep_secs = self.interval.as_secs(),
                "scheduler: waiting for next cycle"
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn run_one<Fut>(&self, cycle: u64, work: Fut)
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let Some(permit) = self.guard.try_begin() else {
            tracing::warn!(cycle, "scheduler: previous cycle still in flight; skipping");
            return;
        };

        tracing::info!(cycle, "scheduler: starting cycle");
        let handle = tokio::spawn(async move {
            let _permit = permit;
            work.await
        });

        match handle.await {
            Ok(Ok(())) => tracing::info!(cycle, "scheduler: cycle complete"),
            Ok(Err(e)) => tracing::error!(cycle, error = %e, "scheduler: cycle failed"),
            Err(e) => tracing::error!(cycle, error = %e, "scheduler: cycle task aborted"),
        }
    }
}
