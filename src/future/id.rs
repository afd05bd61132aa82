use std::fmt;

use crossbeam_utils::atomic::AtomicCell;

/// A unique identifier for a future.
///
/// Identifiers are process-unique and monotonically increasing. They exist
/// for identification and logging only and carry no ordering guarantee
/// across processes.
///
/// # Examples
///
/// ```
/// use future_group::Future;
///
/// let future = Future::new();
/// println!("id = {}", future.id());
/// ```
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
pub struct FutureId(pub(crate) u64);

impl FutureId {
    /// Generates a new `FutureId`.
    pub(crate) fn generate() -> FutureId {
        static COUNTER: AtomicCell<u64> = AtomicCell::new(1);

        let id = COUNTER.fetch_add(1);
        if id > u64::max_value() / 2 {
            std::process::abort();
        }
        FutureId(id)
    }
}

impl fmt::Display for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
