//! One-shot completion cells.
//!
//! A [`Future`] is resolved exactly once to success, error or cancel, and
//! notifies listeners instead of being polled or awaited.

pub use id::FutureId;
pub use state::State;

mod id;
mod state;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use kv_log_macro::trace;
use log::log_enabled;

use crate::error::IllegalTransition;
use crate::fault::Fault;
use crate::group::{self, FutureGroup};
use crate::listeners::ListenerQueue;

type Listener = Box<dyn FnOnce(&Future) + Send>;
type ErrorListener = Box<dyn FnOnce(&Future, &Fault) + Send>;

/// A one-shot, listener-based completion cell.
///
/// The cell starts [`Pending`][State::Pending] and is resolved exactly once
/// through [`succeed`][Future::succeed], [`fail`][Future::fail] or
/// [`cancel`][Future::cancel]. Each resolution drains the matching listener
/// queue and then the complete queue, in registration order. Listeners
/// registered after the cell already completed fire immediately, during
/// registration.
///
/// Handles are cheap to clone and share; all clones observe the same cell.
///
/// # Examples
///
/// ```
/// use future_group::Future;
///
/// let future = Future::new();
/// future
///     .add_success_listener(|f| println!("future {} succeeded", f.id()))
///     .add_error_listener(|_, fault| println!("failed: {}", fault));
///
/// future.succeed().unwrap();
/// assert!(future.is_success());
/// ```
#[derive(Clone)]
pub struct Future {
    inner: Arc<Inner>,
}

struct Inner {
    id: FutureId,
    debug: AtomicBool,
    state: Mutex<FutureState>,
}

struct FutureState {
    state: State,
    fault: Option<Fault>,
    attributes: HashMap<String, Arc<dyn Any + Send + Sync>>,
    complete: ListenerQueue<Listener>,
    success: ListenerQueue<Listener>,
    error: ListenerQueue<ErrorListener>,
    cancel: ListenerQueue<Listener>,
    group: Weak<group::Inner>,
    flushed: bool,
}

impl Future {
    /// Creates a new pending future.
    pub fn new() -> Future {
        Future {
            inner: Arc::new(Inner {
                id: FutureId::generate(),
                debug: AtomicBool::new(false),
                state: Mutex::new(FutureState {
                    state: State::Pending,
                    fault: None,
                    attributes: HashMap::new(),
                    complete: ListenerQueue::new(),
                    success: ListenerQueue::new(),
                    error: ListenerQueue::new(),
                    cancel: ListenerQueue::new(),
                    group: Weak::new(),
                    flushed: false,
                }),
            }),
        }
    }

    /// Returns the unique identifier of this future.
    pub fn id(&self) -> FutureId {
        self.inner.id
    }

    /// Enables trace-level diagnostics for this instance.
    ///
    /// Purely observational: emitted records never affect state.
    pub fn enable_debug(&self) -> &Future {
        self.inner.debug.store(true, Ordering::Relaxed);
        self
    }

    /// Returns the current completion state.
    pub fn state(&self) -> State {
        self.lock().state
    }

    /// Returns `true` once the future has reached any terminal state.
    pub fn is_completed(&self) -> bool {
        self.state().is_terminal()
    }

    /// Returns `true` if the future resolved successfully.
    pub fn is_success(&self) -> bool {
        self.state() == State::Success
    }

    /// Returns `true` if the future resolved with an error.
    pub fn is_error(&self) -> bool {
        self.state() == State::Error
    }

    /// Returns `true` if the future was cancelled.
    pub fn is_cancel(&self) -> bool {
        self.state() == State::Cancel
    }

    /// Returns the stored error detail, if the future resolved with one.
    pub fn error(&self) -> Option<Fault> {
        self.lock().fault.clone()
    }

    /// Resolves the future to success.
    ///
    /// Drains and invokes every queued success listener, then every queued
    /// complete listener, and notifies the owning group, if any. Succeeding
    /// an already-successful future re-runs the (empty) drain and returns
    /// `Ok`; succeeding a future that errored or was cancelled returns
    /// [`IllegalTransition`] without firing anything.
    pub fn succeed(&self) -> Result<(), IllegalTransition> {
        self.resolve(State::Success, None)
    }

    /// Resolves the future as cancelled.
    ///
    /// Drains and invokes every queued cancel listener, then every queued
    /// complete listener. Same conflict rules as [`succeed`][Future::succeed].
    pub fn cancel(&self) -> Result<(), IllegalTransition> {
        self.resolve(State::Cancel, None)
    }

    /// Resolves the future with an error.
    ///
    /// The fault is stored for later retrieval through
    /// [`error`][Future::error] and passed to every queued error listener,
    /// after which the complete listeners drain. `&str` and `String` convert
    /// into [`Fault`] directly.
    ///
    /// # Examples
    ///
    /// ```
    /// use future_group::Future;
    ///
    /// let future = Future::new();
    /// future.add_error_listener(|_, fault| {
    ///     assert_eq!(fault.message(), "upstream timed out");
    /// });
    /// future.fail("upstream timed out").unwrap();
    /// ```
    pub fn fail(&self, fault: impl Into<Fault>) -> Result<(), IllegalTransition> {
        self.resolve(State::Error, Some(fault.into()))
    }

    /// Resolves the future with an error, supplying no detail.
    ///
    /// Reuses a previously stored fault if one exists, otherwise stores a
    /// synthesized "no error detail provided" fault.
    pub fn fail_unspecified(&self) -> Result<(), IllegalTransition> {
        self.resolve(State::Error, None)
    }

    /// Registers a listener invoked when the future completes, whatever the
    /// outcome.
    ///
    /// If the future is already completed the listener fires immediately,
    /// during registration. Returns the future for chained registration.
    pub fn add_listener(&self, listener: impl FnOnce(&Future) + Send + 'static) -> &Future {
        {
            let mut state = self.lock();
            if state.flushed {
                return self;
            }
            state.complete.push(Box::new(listener));
        }
        if self.debug_enabled() {
            trace!("listener added", { future_id: self.inner.id.0 });
        }
        let current = self.state();
        if current.is_terminal() {
            let _ = self.resolve(current, None);
        }
        self
    }

    /// Registers a listener invoked only on success.
    ///
    /// Fires immediately if the future already succeeded.
    pub fn add_success_listener(
        &self,
        listener: impl FnOnce(&Future) + Send + 'static,
    ) -> &Future {
        {
            let mut state = self.lock();
            if state.flushed {
                return self;
            }
            state.success.push(Box::new(listener));
        }
        if self.debug_enabled() {
            trace!("success listener added", { future_id: self.inner.id.0 });
        }
        if self.is_success() {
            let _ = self.resolve(State::Success, None);
        }
        self
    }

    /// Registers a listener invoked only on error, receiving the fault as a
    /// second argument.
    ///
    /// Fires immediately, with the stored fault, if the future already
    /// errored.
    pub fn add_error_listener(
        &self,
        listener: impl FnOnce(&Future, &Fault) + Send + 'static,
    ) -> &Future {
        {
            let mut state = self.lock();
            if state.flushed {
                return self;
            }
            state.error.push(Box::new(listener));
        }
        if self.debug_enabled() {
            trace!("error listener added", { future_id: self.inner.id.0 });
        }
        if self.is_error() {
            let _ = self.resolve(State::Error, None);
        }
        self
    }

    /// Registers a listener invoked only on cancellation.
    ///
    /// Fires immediately if the future was already cancelled.
    pub fn add_cancel_listener(
        &self,
        listener: impl FnOnce(&Future) + Send + 'static,
    ) -> &Future {
        {
            let mut state = self.lock();
            if state.flushed {
                return self;
            }
            state.cancel.push(Box::new(listener));
        }
        if self.debug_enabled() {
            trace!("cancel listener added", { future_id: self.inner.id.0 });
        }
        if self.is_cancel() {
            let _ = self.resolve(State::Cancel, None);
        }
        self
    }

    /// Stores an arbitrary keyed value on the future.
    ///
    /// The attribute bag is caller-managed and independent of completion
    /// state.
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Any + Send + Sync) {
        let mut state = self.lock();
        if state.flushed {
            return;
        }
        state.attributes.insert(key.into(), Arc::new(value));
    }

    /// Retrieves a previously stored attribute, downcast to `T`.
    ///
    /// Returns `None` if the key is absent or holds a value of a different
    /// type.
    ///
    /// # Examples
    ///
    /// ```
    /// use future_group::Future;
    ///
    /// let future = Future::new();
    /// future.set_attribute("attempt", 2u32);
    /// assert_eq!(*future.attribute::<u32>("attempt").unwrap(), 2);
    /// assert!(future.attribute::<String>("attempt").is_none());
    /// ```
    pub fn attribute<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.lock().attributes.get(key)?.clone();
        value.downcast::<T>().ok()
    }

    /// Records this future's owning group.
    ///
    /// The reference is non-owning; it is used only to notify the group when
    /// this future completes. [`FutureGroup::add`] calls this for you.
    /// Binding again simply replaces the reference.
    pub fn bind_to_group(&self, group: &FutureGroup) {
        let mut state = self.lock();
        if state.flushed {
            return;
        }
        state.group = group.downgrade();
    }

    /// Releases all internal state and turns the future inert.
    ///
    /// Every later operation is a silent no-op: resolutions return `Ok`
    /// without firing anything, queries report a pending, empty cell.
    /// Intended as terminal teardown for code that may still hold handles.
    pub fn flush(&self) {
        {
            let mut state = self.lock();
            if state.flushed {
                return;
            }
            state.flushed = true;
            state.state = State::Pending;
            state.fault = None;
            state.attributes.clear();
            state.complete.clear();
            state.success.clear();
            state.error.clear();
            state.cancel.clear();
            state.group = Weak::new();
        }
        if self.debug_enabled() {
            trace!("flushed", { future_id: self.inner.id.0 });
        }
    }

    /// Common resolution path for the three terminal states.
    ///
    /// Transitions out of `Pending` if possible, then dispatches if the cell
    /// holds the target state. Queues are drained under the lock and invoked
    /// after releasing it, so reentrant listeners cannot deadlock.
    fn resolve(&self, target: State, fault: Option<Fault>) -> Result<(), IllegalTransition> {
        let (success, cancel, error, complete, stored_fault, group) = {
            let mut state = self.lock();
            if state.flushed {
                return Ok(());
            }
            if state.state == State::Pending {
                state.state = target;
            }
            if state.state != target {
                return Err(IllegalTransition::new(state.state, target));
            }
            let stored_fault = if target == State::Error {
                let fault = fault
                    .or_else(|| state.fault.clone())
                    .unwrap_or_else(Fault::unspecified);
                state.fault = Some(fault.clone());
                Some(fault)
            } else {
                None
            };
            let success = match target {
                State::Success => state.success.drain(),
                _ => Vec::new(),
            };
            let cancel = match target {
                State::Cancel => state.cancel.drain(),
                _ => Vec::new(),
            };
            let error = match target {
                State::Error => state.error.drain(),
                _ => Vec::new(),
            };
            let complete = state.complete.drain();
            let group = state.group.clone();
            (success, cancel, error, complete, stored_fault, group)
        };

        if self.debug_enabled() {
            trace!("resolution dispatched", {
                future_id: self.inner.id.0,
                state: target.name(),
            });
        }

        for listener in success {
            listener(self);
        }
        for listener in cancel {
            listener(self);
        }
        if let Some(fault) = &stored_fault {
            for listener in error {
                listener(self, fault);
            }
        }
        for listener in complete {
            listener(self);
        }

        if let Some(inner) = group.upgrade() {
            FutureGroup::from_inner(inner).member_completed();
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, FutureState> {
        self.inner.state.lock().unwrap()
    }

    fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed) && log_enabled!(log::Level::Trace)
    }
}

impl Default for Future {
    fn default() -> Future {
        Future::new()
    }
}

impl fmt::Debug for Future {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}
