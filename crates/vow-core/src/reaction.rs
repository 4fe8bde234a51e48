//! Reactions: callbacks registered against a future's settlement

use crate::scheduler::Scheduler;

/// One registered settlement callback
///
/// Created when a consumer attaches to a future (`then`, `recover`,
/// adoption, combinators) and consumed exactly once when the owning future
/// settles. Firing never invokes the callback directly: it wraps the
/// callback and the settled outcome into a type-erased job on the
/// scheduler's microtask queue, so reactions never run inside the call
/// stack that settled the future.
pub(crate) struct Reaction<T, E> {
    callback: Box<dyn FnOnce(Result<T, E>) + Send + 'static>,
}

impl<T, E> Reaction<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub(crate) fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Schedule this reaction with the settled outcome
    pub(crate) fn fire(self, outcome: Result<T, E>, scheduler: &Scheduler) {
        let callback = self.callback;
        scheduler.enqueue(move || callback(outcome));
    }
}
