use std::fmt;

/// The completion state of a [`Future`](crate::Future).
///
/// A future starts out `Pending` and moves to exactly one of the three
/// terminal states exactly once. There is no transition out of a terminal
/// state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum State {
    /// Not yet resolved.
    Pending,
    /// Resolved successfully.
    Success,
    /// Resolved with an error; the detail is retrievable via
    /// [`Future::error`](crate::Future::error).
    Error,
    /// Resolved as cancelled.
    Cancel,
}

impl State {
    /// Returns `true` for every state other than `Pending`.
    pub fn is_terminal(self) -> bool {
        self != State::Pending
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            State::Pending => "pending",
            State::Success => "success",
            State::Error => "error",
            State::Cancel => "cancel",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}
