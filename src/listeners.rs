use std::mem;

/// A drain-on-fire queue of listeners.
///
/// Dispatch consumes every queued listener, so a second dispatch of the same
/// event finds the queue empty and re-fires nothing. Listeners enqueued while
/// a dispatch is in flight are delivered through the late-binding path at
/// registration time, not lost.
pub(crate) struct ListenerQueue<F> {
    queue: Vec<F>,
}

impl<F> ListenerQueue<F> {
    pub(crate) fn new() -> ListenerQueue<F> {
        ListenerQueue { queue: Vec::new() }
    }

    pub(crate) fn push(&mut self, listener: F) {
        self.queue.push(listener);
    }

    /// Removes every queued listener, leaving the queue empty. The caller
    /// invokes them after releasing the state lock.
    pub(crate) fn drain(&mut self) -> Vec<F> {
        mem::replace(&mut self.queue, Vec::new())
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
    }
}
