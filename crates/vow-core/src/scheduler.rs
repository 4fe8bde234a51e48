//! FIFO microtask scheduler
//!
//! Settlement enqueues reaction invocations; the host drains the queue at a
//! turn boundary (end of the current synchronous execution). Jobs enqueued
//! while a drain is running are processed in the same pass, so a drain runs
//! to quiescence.

use crate::error::UnhandledRejection;
use crate::future::FutureId;
use crossbeam::queue::SegQueue;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A type-erased reaction invocation
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler statistics
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Total jobs enqueued since creation
    pub jobs_enqueued: u64,

    /// Total jobs run by drain passes
    pub jobs_run: u64,

    /// Jobs currently waiting in the queue
    pub queued: usize,
}

struct SchedulerInner {
    /// Microtask queue, strict FIFO by enqueue time
    queue: SegQueue<Job>,

    /// Guard against nested drains (single drain thread contract)
    draining: AtomicBool,

    /// Counters for stats
    jobs_enqueued: AtomicU64,
    jobs_run: AtomicU64,

    /// Called after every enqueue so a sleeping host loop can wake up
    wake_hook: Mutex<Option<Arc<dyn Fn() + Send + Sync>>>,

    /// Rejected futures that never had a reaction attached
    unhandled: Mutex<FxHashMap<FutureId, String>>,
}

/// Cloneable handle to the microtask queue
///
/// Futures hold a handle so settlement can enqueue their reactions; the
/// host holds one to drain at turn boundaries. All clones share the same
/// queue.
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// Create a scheduler with an empty queue
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                queue: SegQueue::new(),
                draining: AtomicBool::new(false),
                jobs_enqueued: AtomicU64::new(0),
                jobs_run: AtomicU64::new(0),
                wake_hook: Mutex::new(None),
                unhandled: Mutex::new(FxHashMap::default()),
            }),
        }
    }

    /// Append a job to the queue
    pub fn enqueue<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.queue.push(Box::new(job));
        self.inner.jobs_enqueued.fetch_add(1, Ordering::Relaxed);

        let hook = self.inner.wake_hook.lock().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Run queued jobs until the queue is empty
    ///
    /// Jobs enqueued during the pass run in the same pass. A nested drain
    /// (a job calling `drain` on its own scheduler) is a no-op returning 0;
    /// the outer pass picks up whatever the job enqueued.
    ///
    /// Returns the number of jobs run.
    pub fn drain(&self) -> usize {
        if self.inner.draining.swap(true, Ordering::Acquire) {
            return 0;
        }

        let mut ran = 0usize;
        while let Some(job) = self.inner.queue.pop() {
            job();
            ran += 1;
        }

        self.inner.jobs_run.fetch_add(ran as u64, Ordering::Relaxed);
        self.inner.draining.store(false, Ordering::Release);
        ran
    }

    /// Number of jobs currently queued
    pub fn queued(&self) -> usize {
        self.inner.queue.len()
    }

    /// Get scheduler statistics
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            jobs_enqueued: self.inner.jobs_enqueued.load(Ordering::Relaxed),
            jobs_run: self.inner.jobs_run.load(Ordering::Relaxed),
            queued: self.inner.queue.len(),
        }
    }

    /// Install a hook called after every enqueue
    ///
    /// The host loop uses this to wake from a condvar wait when another
    /// thread settles a future.
    pub fn set_wake_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.wake_hook.lock() = Some(Arc::new(hook));
    }

    /// Record a future that settled rejected with no reaction attached
    pub(crate) fn note_unhandled(&self, future: FutureId, error: String) {
        self.inner.unhandled.lock().insert(future, error);
    }

    /// Clear a recorded rejection once a reaction attaches to the future
    pub(crate) fn clear_unhandled(&self, future: FutureId) {
        self.inner.unhandled.lock().remove(&future);
    }

    /// Take the batch of unhandled rejections observed so far
    ///
    /// Hosts call this after a drain to surface diagnostics. The registry
    /// is emptied; entries are ordered by future id.
    pub fn take_unhandled(&self) -> Vec<UnhandledRejection> {
        let mut report: Vec<UnhandledRejection> = self
            .inner
            .unhandled
            .lock()
            .drain()
            .map(|(future, error)| UnhandledRejection { future, error })
            .collect();
        report.sort_by_key(|entry| entry.future.as_u64());
        report
    }
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_drain_is_fifo() {
        let scheduler = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = Arc::clone(&log);
            scheduler.enqueue(move || log.lock().push(i));
        }

        assert_eq!(scheduler.drain(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_drain_runs_to_quiescence() {
        let scheduler = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_log = Arc::clone(&log);
        let inner_scheduler = scheduler.clone();
        scheduler.enqueue(move || {
            inner_log.lock().push("first");
            let late_log = Arc::clone(&inner_log);
            inner_scheduler.enqueue(move || late_log.lock().push("second"));
        });

        // Both jobs run in the same pass
        assert_eq!(scheduler.drain(), 2);
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_nested_drain_is_noop() {
        let scheduler = Scheduler::new();
        let nested_ran = Arc::new(AtomicUsize::new(usize::MAX));

        let inner_scheduler = scheduler.clone();
        let observed = Arc::clone(&nested_ran);
        scheduler.enqueue(move || {
            observed.store(inner_scheduler.drain(), Ordering::SeqCst);
        });

        assert_eq!(scheduler.drain(), 1);
        assert_eq!(nested_ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stats_counts() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(|| {});
        scheduler.enqueue(|| {});

        let stats = scheduler.stats();
        assert_eq!(stats.jobs_enqueued, 2);
        assert_eq!(stats.jobs_run, 0);
        assert_eq!(stats.queued, 2);
        assert_eq!(scheduler.queued(), 2);

        scheduler.drain();

        let stats = scheduler.stats();
        assert_eq!(stats.jobs_run, 2);
        assert_eq!(stats.queued, 0);
    }

    #[test]
    fn test_wake_hook_fires_on_enqueue() {
        let scheduler = Scheduler::new();
        let pings = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&pings);
        scheduler.set_wake_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.enqueue(|| {});
        scheduler.enqueue(|| {});
        assert_eq!(pings.load(Ordering::SeqCst), 2);
    }
}
