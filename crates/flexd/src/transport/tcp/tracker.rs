use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// Counts connection workers that have not finished yet.
#[derive(Debug, Default)]
pub(super) struct WorkerTracker {
    active: Mutex<usize>,
    drained: Condvar,
}

impl WorkerTracker {
    /// Registers a worker; the count drops when the guard does.
    pub(super) fn enter(self: &Arc<Self>) -> WorkerGuard {
        *self.lock() += 1;
        WorkerGuard {
            tracker: Arc::clone(self),
        }
    }

    pub(super) fn active(&self) -> usize {
        *self.lock()
    }

    /// Blocks until every registered worker has left.
    pub(super) fn wait_drained(&self) {
        let active = self.lock();
        drop(
            self.drained
                .wait_while(active, |active| *active > 0)
                .unwrap_or_else(PoisonError::into_inner),
        );
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held by a connection worker for its whole lifetime.
#[derive(Debug)]
pub(super) struct WorkerGuard {
    tracker: Arc<WorkerTracker>,
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut active = self.tracker.lock();
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.tracker.drained.notify_all();
        }
    }
}
