//! Turn-boundary host loop
//!
//! One control thread owns the scheduler and the timer queue. Each turn
//! fires every due timer job, then drains the microtask queue to
//! quiescence. `block_on` repeats turns, condvar-sleeping between them
//! until the next deadline or until the scheduler's wake hook signals that
//! another thread enqueued work.

use crate::timer::TimerQueue;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use vow_core::{Future, Scheduler};

/// Upper bound on a single condvar wait, so settlements that bypass the
/// wake hook (a future settled with no reactions attached) are still
/// noticed promptly
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Errors from the driver loop
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The awaited future did not settle within the allowed time
    #[error("future did not settle within {waited:?}")]
    TimedOut {
        /// How long the driver waited
        waited: Duration,
    },
}

/// What one turn (or one run) did
#[derive(Debug, Clone, Copy, Default)]
pub struct TurnStats {
    /// Timer jobs fired
    pub timers_fired: usize,

    /// Microtask jobs drained
    pub microtasks_run: usize,
}

struct DriverInner {
    scheduler: Scheduler,
    timers: Mutex<TimerQueue>,
    wake: Condvar,
}

/// Single-threaded host driver supplying turn boundaries
pub struct Driver {
    inner: Arc<DriverInner>,
}

impl Driver {
    /// Create a driver with a fresh scheduler and an empty timer queue
    pub fn new() -> Self {
        let scheduler = Scheduler::new();
        let inner = Arc::new(DriverInner {
            scheduler: scheduler.clone(),
            timers: Mutex::new(TimerQueue::new()),
            wake: Condvar::new(),
        });

        // Wake the condvar whenever anything lands on the microtask queue,
        // including settlements coming from other threads
        let hook_inner = Arc::clone(&inner);
        scheduler.set_wake_hook(move || {
            hook_inner.wake.notify_all();
        });

        Self { inner }
    }

    /// The scheduler this driver drains
    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Register a job to run at a deadline
    pub fn schedule_at<F>(&self, fire_at: Instant, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.timers.lock().push(fire_at, Box::new(job));
        self.inner.wake.notify_all();
    }

    /// Register a job to run after a delay
    pub fn schedule_after<F>(&self, delay: Duration, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_at(Instant::now() + delay, job);
    }

    /// Number of timer jobs not yet fired
    pub fn pending_timers(&self) -> usize {
        self.inner.timers.lock().len()
    }

    /// Run one turn: fire all due timers, then drain microtasks
    pub fn turn(&self) -> TurnStats {
        let mut timers_fired = 0;
        loop {
            // Relock per job so timer handlers can register new timers
            let job = self.inner.timers.lock().pop_due(Instant::now());
            match job {
                Some(job) => {
                    job();
                    timers_fired += 1;
                }
                None => break,
            }
        }

        let microtasks_run = self.inner.scheduler.drain();
        TurnStats {
            timers_fired,
            microtasks_run,
        }
    }

    /// Run turns until a turn does no work and no timer is currently due
    ///
    /// Timers with deadlines still in the future are left pending.
    pub fn run_until_idle(&self) -> TurnStats {
        let mut total = TurnStats::default();
        loop {
            let stats = self.turn();
            total.timers_fired += stats.timers_fired;
            total.microtasks_run += stats.microtasks_run;
            if stats.timers_fired == 0 && stats.microtasks_run == 0 {
                return total;
            }
        }
    }

    /// Run turns until `future` settles or `timeout` elapses
    ///
    /// Between turns the driver sleeps until the next timer deadline, a
    /// wake-hook notification, or the poll interval, whichever comes
    /// first. Returns the settled outcome, or [`DriverError::TimedOut`]
    /// for a future nobody settles in time.
    pub fn block_on<T, E>(
        &self,
        future: &Future<T, E>,
        timeout: Duration,
    ) -> Result<Result<T, E>, DriverError>
    where
        T: Clone + Send + 'static,
        E: Clone + fmt::Debug + Send + 'static,
    {
        let deadline = Instant::now() + timeout;
        loop {
            self.turn();
            if let Some(outcome) = future.result() {
                return Ok(outcome);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(DriverError::TimedOut { waited: timeout });
            }
            if self.inner.scheduler.queued() > 0 {
                continue;
            }

            let mut timers = self.inner.timers.lock();
            let wait_until = timers
                .next_deadline()
                .unwrap_or(deadline)
                .min(deadline)
                .min(now + POLL_INTERVAL);
            if wait_until > now {
                let _ = self.inner.wake.wait_for(&mut timers, wait_until - now);
            }
        }
    }

    /// A future fulfilled with `value` after `delay`
    pub fn delay<T, E>(&self, delay: Duration, value: T) -> Future<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + fmt::Debug + Send + 'static,
    {
        let (future, completer) = Future::pending(self.scheduler());
        self.schedule_after(delay, move || completer.resolve(value));
        future
    }

    /// A future rejected with `error` after `delay`
    pub fn fail_after<T, E>(&self, delay: Duration, error: E) -> Future<T, E>
    where
        T: Clone + Send + 'static,
        E: Clone + fmt::Debug + Send + 'static,
    {
        let (future, completer) = Future::pending(self.scheduler());
        self.schedule_after(delay, move || completer.reject(error));
        future
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vow_core::{FutureState, Step};

    #[test]
    fn test_turn_fires_due_timer_then_drains() {
        let driver = Driver::new();
        let (future, completer) = Future::<i32, &str>::pending(driver.scheduler());
        let derived = future.then(|n| Step::Done(n + 1));

        driver.schedule_after(Duration::ZERO, move || completer.resolve(1));
        std::thread::sleep(Duration::from_millis(1));

        let stats = driver.turn();
        assert_eq!(stats.timers_fired, 1);
        assert_eq!(stats.microtasks_run, 1);
        assert_eq!(derived.result(), Some(Ok(2)));
    }

    #[test]
    fn test_run_until_idle_leaves_future_timers() {
        let driver = Driver::new();
        let future: Future<i32, &str> = driver.delay(Duration::from_secs(60), 1);

        let stats = driver.run_until_idle();
        assert_eq!(stats.timers_fired, 0);
        assert_eq!(future.state(), FutureState::Pending);
        assert_eq!(driver.pending_timers(), 1);
    }

    #[test]
    fn test_block_on_delay() {
        let driver = Driver::new();
        let future: Future<i32, &str> = driver.delay(Duration::from_millis(20), 7);

        let outcome = driver
            .block_on(&future, Duration::from_secs(1))
            .expect("should settle");
        assert_eq!(outcome, Ok(7));
    }

    #[test]
    fn test_block_on_fail_after() {
        let driver = Driver::new();
        let future: Future<i32, &str> = driver.fail_after(Duration::from_millis(20), "late boom");

        let outcome = driver
            .block_on(&future, Duration::from_secs(1))
            .expect("should settle");
        assert_eq!(outcome, Err("late boom"));
    }

    #[test]
    fn test_block_on_times_out_on_forever_pending() {
        let driver = Driver::new();
        let (future, _completer) = Future::<i32, &str>::pending(driver.scheduler());

        let result = driver.block_on(&future, Duration::from_millis(50));
        assert_eq!(
            result,
            Err(DriverError::TimedOut {
                waited: Duration::from_millis(50)
            })
        );
    }

    #[test]
    fn test_block_on_wakes_for_external_settlement() {
        let driver = Driver::new();
        let (future, completer) = Future::<i32, &str>::pending(driver.scheduler());
        // Attach a reaction so settlement enqueues work and pings the hook
        let derived = future.then(|n| Step::Done(n * 2));

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            completer.resolve(21);
        });

        let outcome = driver
            .block_on(&derived, Duration::from_secs(1))
            .expect("should settle");
        assert_eq!(outcome, Ok(42));

        handle.join().unwrap();
    }
}
