use std::fmt;

use crate::future::Future;

/// Input accepted by [`FutureGroup::add`](crate::FutureGroup::add).
///
/// Construction sites pick the variant, replacing the runtime type
/// inspection a dynamic language would do.
pub enum Member {
    /// An existing future adopted into the group.
    Future(Future),
    /// A zero-argument predicate, wrapped in a new member future and
    /// evaluated once at addition: `true` resolves the member to success,
    /// `false` or a panic resolve it to error.
    Predicate(Box<dyn FnOnce() -> bool + Send>),
}

impl Member {
    /// Wraps a predicate closure as group input.
    ///
    /// # Examples
    ///
    /// ```
    /// use future_group::{FutureGroup, Member};
    ///
    /// let group = FutureGroup::new();
    /// group.disable_auto_ready();
    /// group.add(Member::predicate(|| true)).unwrap();
    /// assert!(group.futures()[0].is_success());
    /// ```
    pub fn predicate(predicate: impl FnOnce() -> bool + Send + 'static) -> Member {
        Member::Predicate(Box::new(predicate))
    }
}

impl From<Future> for Member {
    fn from(future: Future) -> Member {
        Member::Future(future)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Future(future) => f.debug_tuple("Future").field(future).finish(),
            Member::Predicate(_) => f.write_str("Predicate"),
        }
    }
}
