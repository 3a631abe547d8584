//! Bounded worker pool for negotiation tasks.
//!
//! Every concurrent phase of the negotiation runs through one pool so a
//! single knob bounds store pressure. A batch is a barrier: all tasks are
//! spawned, all are awaited, and only then is the first failure surfaced.
//! Side effects of sibling tasks that completed before the failure are
//! retained, so shared sets stay usable for diagnostics even on error.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::trace;

use crate::error::{SyncError, SyncResult};

/// Caps the number of negotiation tasks running at once.
///
/// Cheap to clone conceptually but deliberately not `Clone`: one pool per
/// negotiation keeps the bound global across its phases.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// A pool admitting at most `concurrency` tasks at once.
    ///
    /// A requested concurrency of zero is clamped to one; a pool that can
    /// never run anything would deadlock every batch.
    pub fn new(concurrency: usize) -> Self {
        let size = concurrency.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// The admission bound this pool was built with.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) async fn acquire(&self) -> OwnedSemaphorePermit {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("semaphore closed")
    }

    /// Run a batch of tasks under the admission bound and wait for all of
    /// them to settle.
    ///
    /// Successes are collected in completion order. If any task fails (or
    /// panics), the first observed failure is returned, but only after every
    /// sibling has finished.
    pub async fn run_batch<T, F>(&self, tasks: Vec<F>) -> SyncResult<Vec<T>>
    where
        T: Send + 'static,
        F: Future<Output = SyncResult<T>> + Send + 'static,
    {
        trace!(tasks = tasks.len(), bound = self.size, "running batch");
        let mut set = JoinSet::new();
        for task in tasks {
            let permits = Arc::clone(&self.permits);
            set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("semaphore closed");
                task.await
            });
        }

        let mut results = Vec::with_capacity(set.len());
        let mut first_err = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(value)) => results.push(value),
                Ok(Err(err)) => {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
                Err(join_err) => {
                    if first_err.is_none() {
                        first_err = Some(SyncError::Worker(join_err.to_string()));
                    }
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}
