use std::sync::{Arc, Condvar, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use super::{FutureGroup, Inner};

/// A single outstanding deferred-readiness task.
///
/// Each handle owns one named timer thread that waits out the quiet period
/// on a condvar and then reports back to the group, carrying the epoch it
/// was scheduled under so a superseded timer can be told apart from the
/// current one. Dropping the handle cancels the thread.
pub(crate) struct Debounce {
    shared: Arc<Shared>,
}

struct Shared {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl Debounce {
    /// Schedules a readiness transition for `group` after `delay`.
    pub(crate) fn schedule(group: Weak<Inner>, epoch: u64, delay: Duration) -> Debounce {
        let shared = Arc::new(Shared {
            cancelled: Mutex::new(false),
            wake: Condvar::new(),
        });

        let thread_shared = shared.clone();
        thread::Builder::new()
            .name("future-group-debounce".to_string())
            .spawn(move || {
                let deadline = Instant::now() + delay;
                let mut cancelled = thread_shared.cancelled.lock().unwrap();
                loop {
                    if *cancelled {
                        return;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    let (guard, _) = thread_shared
                        .wake
                        .wait_timeout(cancelled, deadline - now)
                        .unwrap();
                    cancelled = guard;
                }
                drop(cancelled);

                if let Some(inner) = group.upgrade() {
                    FutureGroup::from_inner(inner).debounce_fired(epoch);
                }
            })
            .expect("cannot start a thread driving the readiness debounce");

        Debounce { shared }
    }

    /// Cancels the timer. Idempotent: cancelling an already-fired or
    /// already-cancelled timer is a no-op.
    pub(crate) fn cancel(&self) {
        let mut cancelled = self.shared.cancelled.lock().unwrap();
        *cancelled = true;
        self.shared.wake.notify_all();
    }
}

impl Drop for Debounce {
    fn drop(&mut self) {
        self.cancel();
    }
}
