//! Deadline-ordered timer jobs
//!
//! A min-heap of deadline entries; equal deadlines pop in registration
//! order via a sequence tie-break, so timer firing is deterministic.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

/// A type-erased job run when its deadline passes
pub(crate) type TimerJob = Box<dyn FnOnce() + Send + 'static>;

/// Entry in the timer heap
struct TimerEntry {
    /// When to fire
    fire_at: Instant,
    /// Registration sequence, breaks ties between equal deadlines
    seq: u64,
    /// Job to run
    job: TimerJob,
}

// Reverse ordering for min-heap (earliest deadline first, then lowest seq)
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

/// Pending timer jobs, earliest deadline first
pub(crate) struct TimerQueue {
    entries: BinaryHeap<TimerEntry>,
    next_seq: u64,
}

impl TimerQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Register a job to run at a deadline
    pub(crate) fn push(&mut self, fire_at: Instant, job: TimerJob) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(TimerEntry { fire_at, seq, job });
    }

    /// Pop the next job whose deadline has passed, if any
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<TimerJob> {
        if self.entries.peek().map(|entry| entry.fire_at <= now) == Some(true) {
            self.entries.pop().map(|entry| entry.job)
        } else {
            None
        }
    }

    /// Earliest pending deadline, if any
    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.entries.peek().map(|entry| entry.fire_at)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
