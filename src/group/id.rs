use std::fmt;

use crossbeam_utils::atomic::AtomicCell;

/// A unique identifier for a future group.
///
/// Same role as [`FutureId`](crate::FutureId): process-unique, monotonic,
/// used for identification and logging only.
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
pub struct GroupId(pub(crate) u64);

impl GroupId {
    /// Generates a new `GroupId`.
    pub(crate) fn generate() -> GroupId {
        static COUNTER: AtomicCell<u64> = AtomicCell::new(1);

        let id = COUNTER.fetch_add(1);
        if id > u64::max_value() / 2 {
            std::process::abort();
        }
        GroupId(id)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
