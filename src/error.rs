use std::error::Error;
use std::fmt;

use crate::future::State;

/// An error returned when resolving a future that has already completed with
/// a different outcome.
///
/// Re-resolving a future to the state it already holds is tolerated (the
/// listener queues were drained on the first pass, so nothing re-fires);
/// only a *conflicting* terminal state is rejected.
///
/// # Examples
///
/// ```
/// use future_group::{Future, State};
///
/// let future = Future::new();
/// future.succeed().unwrap();
///
/// let err = future.cancel().unwrap_err();
/// assert_eq!(err.current(), State::Success);
/// assert_eq!(err.attempted(), State::Cancel);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IllegalTransition {
    current: State,
    attempted: State,
}

impl IllegalTransition {
    pub(crate) fn new(current: State, attempted: State) -> IllegalTransition {
        IllegalTransition { current, attempted }
    }

    /// The terminal state the future already holds.
    pub fn current(&self) -> State {
        self.current
    }

    /// The state the rejected resolution attempted to enter.
    pub fn attempted(&self) -> State {
        self.attempted
    }
}

impl Error for IllegalTransition {}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot resolve future to {}, already resolved to {}",
            self.attempted, self.current
        )
    }
}

/// An error returned when adding a member to a group that is already ready.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GroupReady {
    _private: (),
}

impl GroupReady {
    pub(crate) fn new() -> GroupReady {
        GroupReady { _private: () }
    }
}

impl Error for GroupReady {}

impl fmt::Display for GroupReady {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "future group is ready, no more members can be added".fmt(f)
    }
}
