//! One-shot shutdown coordination shared by the timer, the interrupt
//! listener and the engine of a single crawl

use crate::state::ExitContext;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tokio_util::task::TaskTracker;

/// Shutdown coordinator for one crawl
///
/// The first call to [`Synchron::notify_stop`] records the exit reason and
/// wakes every task waiting on [`Synchron::stopped`]. Later calls are no-ops.
#[derive(Debug, Default)]
pub struct Synchron {
    stop: CancellationToken,
    exit: Mutex<Option<ExitContext>>,
    tasks: TaskTracker,
}

impl Synchron {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the crawl to stop for `reason`
    ///
    /// Returns true only for the call that took effect.
    pub fn notify_stop(&self, reason: ExitContext) -> bool {
        let mut exit = self.exit.lock().unwrap_or_else(PoisonError::into_inner);
        if exit.is_some() {
            return false;
        }
        *exit = Some(reason);
        self.stop.cancel();
        true
    }

    /// The recorded exit reason, `None` while the crawl is still running
    pub fn exit_context(&self) -> Option<ExitContext> {
        *self.exit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Resolves once a stop has been requested
    pub fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.stop.cancelled()
    }

    /// Spawns a participant whose termination [`Synchron::wait`] joins on
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tasks.spawn(task)
    }

    /// Waits for every spawned participant to terminate
    ///
    /// No further participants can be spawned after this is called.
    pub async fn wait(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_first_notify_wins() {
        let synchron = Synchron::new();
        assert_eq!(synchron.exit_context(), None);
        assert!(!synchron.is_stopped());

        assert!(synchron.notify_stop(ExitContext::Timeout));
        assert!(!synchron.notify_stop(ExitContext::Signal));

        assert!(synchron.is_stopped());
        assert_eq!(synchron.exit_context(), Some(ExitContext::Timeout));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_notify_broadcasts_once() {
        let synchron = Arc::new(Synchron::new());
        let reasons = [
            ExitContext::Signal,
            ExitContext::Timeout,
            ExitContext::LinksExhausted,
        ];

        let handles: Vec<_> = (0..30)
            .map(|i| {
                let synchron = Arc::clone(&synchron);
                let reason = reasons[i % reasons.len()];
                tokio::spawn(async move { synchron.notify_stop(reason) })
            })
            .collect();

        let mut effective = 0;
        for handle in handles {
            if handle.await.unwrap() {
                effective += 1;
            }
        }

        assert_eq!(effective, 1);
        assert!(synchron.exit_context().is_some());
    }

    #[tokio::test]
    async fn test_waiters_are_woken() {
        let synchron = Arc::new(Synchron::new());

        let waiter = {
            let synchron = Arc::clone(&synchron);
            tokio::spawn(async move { synchron.stopped().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        synchron.notify_stop(ExitContext::LinksExhausted);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter was not woken")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_joins_participants() {
        let synchron = Arc::new(Synchron::new());

        for _ in 0..3 {
            let inner = Arc::clone(&synchron);
            synchron.spawn(async move { inner.stopped().await });
        }

        synchron.notify_stop(ExitContext::Signal);
        tokio::time::timeout(Duration::from_secs(1), synchron.wait())
            .await
            .expect("participants did not terminate");
    }
}
