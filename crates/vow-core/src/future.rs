//! Future cells and the settlement capability
//!
//! A `Future<T, E>` is a cloneable handle to one eventual outcome. The
//! matching `Completer<T, E>` carries the resolve/reject capability; only
//! the first settlement has effect, every later call is a no-op.
//! Reactions attached via `then`/`recover` never run inside the settling
//! call: they are enqueued on the scheduler and run at the next drain.

use crate::reaction::Reaction;
use crate::scheduler::Scheduler;
use crate::state::{FutureState, State};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Unique identifier for a Future
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FutureId(u64);

static NEXT_FUTURE_ID: AtomicU64 = AtomicU64::new(1);

impl FutureId {
    /// Generate a new unique FutureId
    pub(crate) fn new() -> Self {
        FutureId(NEXT_FUTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// What a reaction handler tells the runtime to do with the derived future
pub enum Step<T, E> {
    /// Fulfill the derived future with a plain value
    Done(T),

    /// Adopt another future: the derived future mirrors its eventual
    /// outcome instead of fulfilling with the future itself
    Wait(Future<T, E>),

    /// Reject the derived future
    Fail(E),
}

/// Shared cell behind every future handle
struct Shared<T, E> {
    /// Settlement state; terminal once it leaves Pending
    state: State<T, E>,

    /// Reactions waiting for settlement, in registration order
    reactions: Vec<Reaction<T, E>>,

    /// Whether any reaction was ever attached (drives the
    /// unhandled-rejection diagnostic)
    observed: bool,
}

/// A value cell representing a computation that completes later,
/// exactly once, with success or failure
pub struct Future<T, E> {
    id: FutureId,
    shared: Arc<Mutex<Shared<T, E>>>,
    scheduler: Scheduler,
}

/// The resolve/reject capability bound to one future
///
/// Handed to executors by [`Future::new`] and returned by
/// [`Future::pending`]. Cloneable; all clones share the settle-once guard.
pub struct Completer<T, E> {
    future: Future<T, E>,
}

impl<T, E> Future<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + fmt::Debug + Send + 'static,
{
    /// Create a pending future together with its completer
    pub fn pending(scheduler: &Scheduler) -> (Self, Completer<T, E>) {
        let future = Self {
            id: FutureId::new(),
            shared: Arc::new(Mutex::new(Shared {
                state: State::Pending,
                reactions: Vec::new(),
                observed: false,
            })),
            scheduler: scheduler.clone(),
        };
        let completer = Completer {
            future: future.clone(),
        };
        (future, completer)
    }

    /// Create a future and run `executor` synchronously with its completer
    ///
    /// An `Err` return rejects the future; if the executor already settled
    /// it, the error is ignored (settle-once).
    pub fn new<F>(scheduler: &Scheduler, executor: F) -> Self
    where
        F: FnOnce(Completer<T, E>) -> Result<(), E>,
    {
        let (future, completer) = Self::pending(scheduler);
        if let Err(error) = executor(completer.clone()) {
            completer.reject(error);
        }
        future
    }

    /// Create an already-fulfilled future
    pub fn fulfilled(scheduler: &Scheduler, value: T) -> Self {
        let (future, completer) = Self::pending(scheduler);
        completer.resolve(value);
        future
    }

    /// Create an already-rejected future
    ///
    /// Like any rejected future, it is reported as unhandled unless a
    /// reaction attaches before the host collects diagnostics.
    pub fn rejected(scheduler: &Scheduler, error: E) -> Self {
        let (future, completer) = Self::pending(scheduler);
        completer.reject(error);
        future
    }

    /// Unique id of this future
    pub fn id(&self) -> FutureId {
        self.id
    }

    /// The scheduler this future enqueues its reactions on
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Current settlement phase
    pub fn state(&self) -> FutureState {
        self.shared.lock().state.phase()
    }

    /// Snapshot of the settled outcome, if any
    pub fn result(&self) -> Option<Result<T, E>> {
        self.shared.lock().state.snapshot()
    }

    /// Attach a raw settlement callback
    ///
    /// If the future is already settled the callback is scheduled, never
    /// run synchronously. Attaching marks the future observed, which
    /// transfers unhandled-rejection responsibility downstream.
    pub(crate) fn subscribe<F>(&self, callback: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let outcome = {
            let mut shared = self.shared.lock();
            shared.observed = true;
            if shared.state.is_pending() {
                shared.reactions.push(Reaction::new(callback));
                return;
            }
            shared.state.snapshot().expect("state checked settled")
        };

        if outcome.is_err() {
            self.scheduler.clear_unhandled(self.id);
        }
        Reaction::new(callback).fire(outcome, &self.scheduler);
    }

    /// Transition to settled and schedule all registered reactions
    ///
    /// No-op if already settled.
    fn settle(&self, outcome: Result<T, E>) {
        let mut unhandled_note = None;
        let reactions = {
            let mut shared = self.shared.lock();
            if !shared.state.is_pending() {
                return;
            }
            shared.state = match &outcome {
                Ok(value) => State::Fulfilled(value.clone()),
                Err(error) => State::Rejected(error.clone()),
            };
            if let Err(error) = &outcome {
                if !shared.observed {
                    unhandled_note = Some(format!("{error:?}"));
                }
            }
            std::mem::take(&mut shared.reactions)
        };

        if let Some(text) = unhandled_note {
            self.scheduler.note_unhandled(self.id, text);
        }
        for reaction in reactions {
            reaction.fire(outcome.clone(), &self.scheduler);
        }
    }

    /// Register a fulfillment handler; rejections pass through unchanged
    ///
    /// The handler's [`Step`] decides the derived future: `Done` fulfills
    /// it, `Wait` adopts another future, `Fail` rejects it.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Future<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Step<U, E> + Send + 'static,
    {
        let (derived, completer) = Future::pending(&self.scheduler);
        self.subscribe(move |outcome| match outcome {
            Ok(value) => completer.apply(on_fulfilled(value)),
            Err(error) => completer.reject(error),
        });
        derived
    }

    /// Register a rejection handler; fulfillments pass through unchanged
    pub fn recover<F>(&self, on_rejected: F) -> Future<T, E>
    where
        F: FnOnce(E) -> Step<T, E> + Send + 'static,
    {
        let (derived, completer) = Future::pending(&self.scheduler);
        self.subscribe(move |outcome| match outcome {
            Ok(value) => completer.resolve(value),
            Err(error) => completer.apply(on_rejected(error)),
        });
        derived
    }

    /// Register handlers for both arms
    pub fn then_with<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Future<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Step<U, E> + Send + 'static,
        R: FnOnce(E) -> Step<U, E> + Send + 'static,
    {
        let (derived, completer) = Future::pending(&self.scheduler);
        self.subscribe(move |outcome| match outcome {
            Ok(value) => completer.apply(on_fulfilled(value)),
            Err(error) => completer.apply(on_rejected(error)),
        });
        derived
    }

    /// Run a callback on settlement and pass the outcome through unchanged
    pub fn finally_do<F>(&self, callback: F) -> Future<T, E>
    where
        F: FnOnce() + Send + 'static,
    {
        let (derived, completer) = Future::pending(&self.scheduler);
        self.subscribe(move |outcome| {
            callback();
            match outcome {
                Ok(value) => completer.resolve(value),
                Err(error) => completer.reject(error),
            }
        });
        derived
    }
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            shared: Arc::clone(&self.shared),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future").field("id", &self.id).finish()
    }
}

impl<T, E> Completer<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + fmt::Debug + Send + 'static,
{
    /// Fulfill the future with a plain value
    pub fn resolve(&self, value: T) {
        self.future.settle(Ok(value));
    }

    /// Reject the future
    pub fn reject(&self, error: E) {
        self.future.settle(Err(error));
    }

    /// Resolve with another future: mirror its eventual outcome
    ///
    /// This is the adoption path for "resolving with a future" — the
    /// completer's future stays pending until `source` settles, then
    /// fulfills or rejects the same way. There is no adoption on the
    /// rejection path.
    pub fn adopt(&self, source: Future<T, E>) {
        let target = self.clone();
        source.subscribe(move |outcome| match outcome {
            Ok(value) => target.resolve(value),
            Err(error) => target.reject(error),
        });
    }

    /// Apply a handler verdict
    pub fn apply(&self, step: Step<T, E>) {
        match step {
            Step::Done(value) => self.resolve(value),
            Step::Wait(source) => self.adopt(source),
            Step::Fail(error) => self.reject(error),
        }
    }

    /// Id of the future this completer settles
    pub fn future_id(&self) -> FutureId {
        self.future.id()
    }
}

impl<T, E> Clone for Completer<T, E> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Completer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer").field("id", &self.future.id).finish()
    }
}
