//! Settlement state of a future cell

/// Observable settlement phase of a future
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FutureState {
    /// Not yet settled
    Pending,
    /// Settled with a value
    Fulfilled,
    /// Settled with an error
    Rejected,
}

/// Internal tagged state carrying the settled payload
///
/// Terminal once it leaves `Pending`; the settle path checks `is_pending`
/// under the cell lock before writing, which is the whole settle-once
/// invariant.
pub(crate) enum State<T, E> {
    /// Not yet settled
    Pending,
    /// Settled with a value
    Fulfilled(T),
    /// Settled with an error
    Rejected(E),
}

impl<T, E> State<T, E> {
    pub(crate) fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    pub(crate) fn phase(&self) -> FutureState {
        match self {
            State::Pending => FutureState::Pending,
            State::Fulfilled(_) => FutureState::Fulfilled,
            State::Rejected(_) => FutureState::Rejected,
        }
    }
}

impl<T: Clone, E: Clone> State<T, E> {
    /// Clone out the settled outcome, if any
    pub(crate) fn snapshot(&self) -> Option<Result<T, E>> {
        match self {
            State::Pending => None,
            State::Fulfilled(value) => Some(Ok(value.clone())),
            State::Rejected(error) => Some(Err(error.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_tags() {
        assert_eq!(State::<i32, &str>::Pending.phase(), FutureState::Pending);
        assert_eq!(State::<i32, &str>::Fulfilled(1).phase(), FutureState::Fulfilled);
        assert_eq!(State::<i32, &str>::Rejected("e").phase(), FutureState::Rejected);
    }

    #[test]
    fn test_snapshot() {
        let state: State<i32, &str> = State::Fulfilled(7);
        assert_eq!(state.snapshot(), Some(Ok(7)));

        let state: State<i32, &str> = State::Rejected("boom");
        assert_eq!(state.snapshot(), Some(Err("boom")));

        let state: State<i32, &str> = State::Pending;
        assert_eq!(state.snapshot(), None);
        assert!(state.is_pending());
    }
}
