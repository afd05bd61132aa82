use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error detail carried by a future resolved to the error state.
///
/// A `Fault` is data, not control flow: [`Future::fail`] stores it on the
/// future and replays it to every error listener, including listeners that
/// register after completion. Faults are cheap to clone.
///
/// [`Future::fail`]: crate::Future::fail
///
/// # Examples
///
/// ```
/// use future_group::Future;
///
/// let future = Future::new();
/// future.fail("connection reset").unwrap();
/// assert_eq!(future.error().unwrap().message(), "connection reset");
/// ```
#[derive(Clone, Debug)]
pub struct Fault {
    message: Arc<str>,
}

impl Fault {
    /// Creates a fault from a message.
    pub fn new(message: impl Into<String>) -> Fault {
        Fault {
            message: message.into().into(),
        }
    }

    /// Returns the fault message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The fault stored when the error state is triggered with no detail.
    pub(crate) fn unspecified() -> Fault {
        Fault::new("error state triggered, no error detail provided")
    }

    /// Builds a fault out of a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Fault {
        if let Some(message) = payload.downcast_ref::<&'static str>() {
            Fault::new(*message)
        } else if let Some(message) = payload.downcast_ref::<String>() {
            Fault::new(message.clone())
        } else {
            Fault::new("predicate panicked")
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.message.fmt(f)
    }
}

impl Error for Fault {}

impl From<&str> for Fault {
    fn from(message: &str) -> Fault {
        Fault::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Fault {
        Fault::new(message)
    }
}
