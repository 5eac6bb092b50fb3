//! Worker roster.
//!
//! The tile runs the driver next to a fixed set of busy filler workers so
//! the driver is exercised under full scheduler occupancy. On the host the
//! driver loop runs on a blocking thread and the fillers are cooperative
//! `tokio` tasks that yield after every tick. Fillers never finish on their
//! own; they are aborted once the worker returns.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

use crate::config::FILLER_WORKERS;

/// What a roster run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterOutcome<T> {
    /// Return value of the functional worker.
    pub value: T,
    /// Iterations the fillers completed while the worker ran.
    pub filler_ticks: u64,
}

/// One functional worker plus `fillers` no-op tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRoster {
    fillers: usize,
}

impl Default for WorkerRoster {
    fn default() -> Self {
        Self::new(FILLER_WORKERS)
    }
}

impl WorkerRoster {
    /// Roster with `fillers` background tasks.
    pub fn new(fillers: usize) -> Self {
        Self { fillers }
    }

    /// Number of filler tasks.
    pub fn fillers(&self) -> usize {
        self.fillers
    }

    /// Run `worker` to completion with the fillers spinning alongside.
    ///
    /// Fails only if the worker panicked.
    pub async fn run<F, T>(&self, worker: F) -> Result<RosterOutcome<T>, JoinError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let ticks = Arc::new(AtomicU64::new(0));
        let mut fillers = JoinSet::new();
        for _ in 0..self.fillers {
            let ticks = Arc::clone(&ticks);
            fillers.spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            });
        }
        debug!("roster: worker started with {} fillers", self.fillers);

        let result = tokio::task::spawn_blocking(worker).await;

        fillers.abort_all();
        while fillers.join_next().await.is_some() {}

        let value = result?;
        let filler_ticks = ticks.load(Ordering::Relaxed);
        debug!("roster: worker finished, fillers ticked {} times", filler_ticks);
        Ok(RosterOutcome { value, filler_ticks })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_roster_has_seven_fillers() {
        assert_eq!(WorkerRoster::default().fillers(), 7);
    }

    #[tokio::test]
    async fn worker_value_is_returned() {
        let outcome = WorkerRoster::new(3).run(|| 6 * 7).await.unwrap();
        assert_eq!(outcome.value, 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn fillers_run_while_worker_blocks() {
        let outcome = WorkerRoster::default()
            .run(|| std::thread::sleep(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(outcome.filler_ticks > 0);
    }

    #[tokio::test]
    async fn no_fillers_means_no_ticks() {
        let outcome = WorkerRoster::new(0).run(|| "done").await.unwrap();
        assert_eq!(outcome.value, "done");
        assert_eq!(outcome.filler_ticks, 0);
    }

    #[tokio::test]
    async fn worker_panic_surfaces_as_join_error() {
        let result = WorkerRoster::new(1).run(|| panic!("driver crashed")).await;
        assert!(result.unwrap_err().is_panic());
    }
}
