use crate::mirror_job::MirrorJob;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A job together with the position it was submitted at.
#[derive(Debug)]
pub struct QueuedJob {
    pub index: usize,
    pub job: MirrorJob,
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<QueuedJob>,
    next_index: usize,
    unfinished: usize,
}

/// Unbounded queue of mirror jobs shared by the worker pool.
///
/// Only [`MirrorJob`] values can be queued; anything else is rejected at
/// compile time:
///
/// ```compile_fail
/// use synchronizer_core::job_queue::JobQueue;
///
/// let queue = JobQueue::new();
/// queue.enqueue("https://example.com/repo.git");
/// ```
///
/// Each dequeued job is handed to exactly one caller. Dequeue order is not
/// part of the contract.
#[derive(Debug, Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
    all_done: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `job` and returns its submission index.
    pub fn enqueue(&self, job: MirrorJob) -> usize {
        let mut state = self.lock();
        let index = state.next_index;
        state.next_index += 1;
        state.unfinished += 1;
        state.pending.push_back(QueuedJob { index, job });
        index
    }

    /// Never blocks; `None` means nothing is left to hand out.
    pub fn try_dequeue(&self) -> Option<QueuedJob> {
        self.lock().pending.pop_front()
    }

    /// Marks one dequeued job as finished.
    pub fn task_done(&self) {
        let mut state = self.lock();
        assert!(
            state.unfinished > 0,
            "task_done called more times than jobs were enqueued"
        );
        state.unfinished -= 1;
        if state.unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Blocks until every enqueued job has been dequeued and marked done.
    pub fn join(&self) {
        let mut state = self.lock();
        while state.unfinished > 0 {
            state = self
                .all_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
