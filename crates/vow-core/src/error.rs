//! Diagnostics surfaced to the host

use crate::future::FutureId;
use thiserror::Error;

/// A future settled rejected and never had a reaction attached
///
/// Collected by [`crate::Scheduler::take_unhandled`] after a drain. This is
/// a diagnostic for the host, never a fatal runtime condition: the error
/// stays carried in the future's rejected state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("future {future:?} rejected with no handler attached: {error}")]
pub struct UnhandledRejection {
    /// The future that was rejected
    pub future: FutureId,

    /// The rejection error, rendered with its Debug form
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Future, Scheduler};

    #[test]
    fn test_display_names_future_and_error() {
        let scheduler = Scheduler::new();
        let future = Future::<i32, &str>::rejected(&scheduler, "boom");

        let report = scheduler.take_unhandled();
        let message = report[0].to_string();
        assert!(message.contains(&format!("{:?}", future.id())));
        assert!(message.contains("boom"));
    }
}
