//! Combinators over collections of futures
//!
//! Both combinators take their inputs as a slice of handles and never
//! mutate it; duplicate handles are awaited independently. The derived
//! future's own settle-once guard is what makes "first rejection wins" and
//! "first settlement wins" hold without extra bookkeeping.

use crate::future::{Completer, Future};
use crate::scheduler::Scheduler;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fulfill with every input's value, in input order
///
/// Rejects as soon as any input rejects, with that input's error; later
/// settlements of the other inputs are observed but change nothing. An
/// empty slice fulfills immediately with an empty vector.
pub fn all<T, E>(scheduler: &Scheduler, inputs: &[Future<T, E>]) -> Future<Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Clone + fmt::Debug + Send + 'static,
{
    if inputs.is_empty() {
        return Future::fulfilled(scheduler, Vec::new());
    }

    let (aggregate, completer) = Future::pending(scheduler);
    let slots: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; inputs.len()]));
    let remaining = Arc::new(AtomicUsize::new(inputs.len()));

    for (index, input) in inputs.iter().enumerate() {
        let slots = Arc::clone(&slots);
        let remaining = Arc::clone(&remaining);
        let completer: Completer<Vec<T>, E> = completer.clone();

        input.subscribe(move |outcome| match outcome {
            Ok(value) => {
                let finished = {
                    let mut slots = slots.lock();
                    slots[index] = Some(value);
                    remaining.fetch_sub(1, Ordering::AcqRel) == 1
                };
                if finished {
                    let values: Vec<T> = {
                        let mut slots = slots.lock();
                        slots
                            .iter_mut()
                            .map(|slot| slot.take().expect("every slot filled at completion"))
                            .collect()
                    };
                    completer.resolve(values);
                }
            }
            Err(error) => completer.reject(error),
        });
    }

    aggregate
}

/// Settle with the outcome of whichever input settles first
///
/// Later settlements of the other inputs are ignored. An empty slice stays
/// pending forever.
pub fn race<T, E>(scheduler: &Scheduler, inputs: &[Future<T, E>]) -> Future<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + fmt::Debug + Send + 'static,
{
    let (winner, completer) = Future::pending(scheduler);

    for input in inputs {
        let completer = completer.clone();
        input.subscribe(move |outcome| match outcome {
            Ok(value) => completer.resolve(value),
            Err(error) => completer.reject(error),
        });
    }

    winner
}
