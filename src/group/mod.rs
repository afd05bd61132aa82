//! Aggregation of many futures into one completion signal.
//!
//! A [`FutureGroup`] owns a set of member futures and derives an aggregate
//! outcome from them once every member has individually completed. Aggregate
//! dispatch is gated on *readiness*: listeners never fire while the caller
//! may still be adding members. Readiness arrives either explicitly through
//! [`FutureGroup::mark_ready`] or automatically after a debounce window with
//! no further additions.

pub use id::GroupId;
pub use member::Member;

mod debounce;
mod id;
mod member;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use kv_log_macro::trace;
use log::log_enabled;

use debounce::Debounce;

use crate::error::GroupReady;
use crate::fault::Fault;
use crate::future::Future;
use crate::listeners::ListenerQueue;

/// Default quiet period a group waits after an addition before marking
/// itself ready.
const DEFAULT_READY_DELAY: Duration = Duration::from_millis(250);

type Listener = Box<dyn FnOnce(&FutureGroup) + Send>;
type ErrorListener = Box<dyn FnOnce(&FutureGroup, &Fault, &[Fault]) + Send>;

/// A collection of futures with one combined completion signal.
///
/// Members are added while the group is not yet ready, either as existing
/// [`Future`]s or as predicate closures wrapped into immediately-resolved
/// member futures. Once ready, every member completion re-evaluates the
/// aggregate: success fires when all members succeeded, error when at least
/// one errored, cancel when at least one was cancelled and none errored.
/// Error takes precedence over cancel when both hold.
///
/// # Examples
///
/// ```
/// use future_group::FutureGroup;
///
/// let group = FutureGroup::new();
/// group.disable_auto_ready();
///
/// let upload = group.new_future().unwrap();
/// let index = group.new_future().unwrap();
/// group.add_error_listener(|_, last, all| {
///     println!("{} member(s) failed, last: {}", all.len(), last);
/// });
/// group.mark_ready();
///
/// upload.succeed().unwrap();
/// index.fail("disk full").unwrap();
/// assert!(group.is_error());
/// ```
#[derive(Clone)]
pub struct FutureGroup {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    id: GroupId,
    debug: AtomicBool,
    state: Mutex<GroupState>,
}

struct GroupState {
    members: Vec<Future>,
    ready: bool,
    ready_delay: Duration,
    timer: Option<Debounce>,
    timer_epoch: u64,
    complete: ListenerQueue<Listener>,
    success: ListenerQueue<Listener>,
    error: ListenerQueue<ErrorListener>,
    cancel: ListenerQueue<Listener>,
}

impl FutureGroup {
    /// Creates a new group: empty, not ready, with the default 250 ms
    /// debounce window.
    pub fn new() -> FutureGroup {
        FutureGroup {
            inner: Arc::new(Inner {
                id: GroupId::generate(),
                debug: AtomicBool::new(false),
                state: Mutex::new(GroupState {
                    members: Vec::new(),
                    ready: false,
                    ready_delay: DEFAULT_READY_DELAY,
                    timer: None,
                    timer_epoch: 0,
                    complete: ListenerQueue::new(),
                    success: ListenerQueue::new(),
                    error: ListenerQueue::new(),
                    cancel: ListenerQueue::new(),
                }),
            }),
        }
    }

    /// Returns the unique identifier of this group.
    pub fn id(&self) -> GroupId {
        self.inner.id
    }

    /// Enables trace-level diagnostics for this instance, including a member
    /// status dump on every ready re-evaluation.
    pub fn enable_debug(&self) -> &FutureGroup {
        self.inner.debug.store(true, Ordering::Relaxed);
        self
    }

    /// Disables the automatic readiness transition.
    ///
    /// Subsequent additions schedule no debounce timer; the caller must
    /// invoke [`mark_ready`][FutureGroup::mark_ready] once all members are
    /// added.
    pub fn disable_auto_ready(&self) -> &FutureGroup {
        self.lock().ready_delay = Duration::from_millis(0);
        self
    }

    /// Sets the debounce window applied to subsequent additions.
    ///
    /// A zero duration is equivalent to
    /// [`disable_auto_ready`][FutureGroup::disable_auto_ready].
    pub fn set_ready_delay(&self, delay: Duration) -> &FutureGroup {
        self.lock().ready_delay = delay;
        self
    }

    /// Creates a new future, adds it to the group and returns it for the
    /// caller to resolve.
    pub fn new_future(&self) -> Result<Future, GroupReady> {
        let future = Future::new();
        self.add(future.clone())?;
        Ok(future)
    }

    /// Adds a member to the group.
    ///
    /// Fails with [`GroupReady`] once the group is ready. Every addition
    /// supersedes the pending debounce timer, so readiness only arrives
    /// after a quiet period with no further additions.
    ///
    /// A [`Member::Future`] is bound to this group and stored. A
    /// [`Member::Predicate`] is wrapped in a new bound future, stored, and
    /// evaluated once on the spot: `true` resolves the member to success,
    /// `false` to an error reading "Closure returned false!", and a panic is
    /// caught and stored as the member's fault rather than propagated. The
    /// member is kept whatever the outcome.
    pub fn add(&self, member: impl Into<Member>) -> Result<&FutureGroup, GroupReady> {
        let pending = {
            let mut state = self.lock();
            if state.ready {
                return Err(GroupReady::new());
            }
            self.reschedule_debounce(&mut state);
            match member.into() {
                Member::Future(future) => {
                    future.bind_to_group(self);
                    state.members.push(future);
                    None
                }
                Member::Predicate(predicate) => {
                    let future = Future::new();
                    future.bind_to_group(self);
                    state.members.push(future.clone());
                    Some((future, predicate))
                }
            }
        };

        match pending {
            Some((future, predicate)) => {
                if self.debug_enabled() {
                    trace!("predicate member added", {
                        group_id: self.inner.id.0,
                        future_id: future.id().0,
                    });
                }
                // The group is not ready yet, so resolving here cannot fire
                // aggregate listeners prematurely. The member is fresh and
                // pending; these resolutions cannot conflict.
                match panic::catch_unwind(AssertUnwindSafe(predicate)) {
                    Ok(true) => {
                        let _ = future.succeed();
                    }
                    Ok(false) => {
                        let _ = future.fail("Closure returned false!");
                    }
                    Err(payload) => {
                        let _ = future.fail(Fault::from_panic(payload));
                    }
                }
            }
            None => {
                if self.debug_enabled() {
                    trace!("future member added", { group_id: self.inner.id.0 });
                }
            }
        }
        Ok(self)
    }

    /// Adds a predicate closure as a member.
    ///
    /// Convenience for `add(Member::predicate(..))`.
    pub fn add_predicate(
        &self,
        predicate: impl FnOnce() -> bool + Send + 'static,
    ) -> Result<&FutureGroup, GroupReady> {
        self.add(Member::predicate(predicate))
    }

    /// Marks the group ready: no more members are accepted and aggregate
    /// listeners may fire from now on.
    ///
    /// Cancels any pending debounce timer and immediately re-evaluates
    /// aggregate completion. Safe to call repeatedly.
    pub fn mark_ready(&self) {
        {
            let mut state = self.lock();
            state.timer_epoch += 1;
            state.timer = None;
            state.ready = true;
        }
        if self.debug_enabled() {
            trace!("ready", { group_id: self.inner.id.0 });
        }
        self.member_completed();
    }

    /// Returns the member futures in insertion order.
    pub fn futures(&self) -> Vec<Future> {
        self.lock().members.clone()
    }

    /// Returns the members currently in the error state, in insertion order.
    pub fn error_futures(&self) -> Vec<Future> {
        self.futures()
            .into_iter()
            .filter(|future| future.is_error())
            .collect()
    }

    /// Returns the faults of the errored members, in member order.
    pub fn errors(&self) -> Vec<Fault> {
        self.error_futures()
            .iter()
            .filter_map(|future| future.error())
            .collect()
    }

    /// Returns `true` if the group has at least one member and every member
    /// has individually completed, irrespective of readiness.
    pub fn is_completed(&self) -> bool {
        let members = self.futures();
        !members.is_empty() && members.iter().all(|future| future.is_completed())
    }

    /// Returns `true` if every member completed successfully.
    pub fn is_success(&self) -> bool {
        let members = self.futures();
        !members.is_empty() && members.iter().all(|future| future.is_success())
    }

    /// Returns `true` if all members completed and at least one errored.
    ///
    /// Not mutually exclusive with [`is_cancel`][FutureGroup::is_cancel]; a
    /// group holding both an errored and a cancelled member reports both.
    /// Dispatch resolves the overlap in favor of error.
    pub fn is_error(&self) -> bool {
        let members = self.futures();
        !members.is_empty()
            && members.iter().all(|future| future.is_completed())
            && members.iter().any(|future| future.is_error())
    }

    /// Returns `true` if all members completed and at least one was
    /// cancelled.
    pub fn is_cancel(&self) -> bool {
        let members = self.futures();
        !members.is_empty()
            && members.iter().all(|future| future.is_completed())
            && members.iter().any(|future| future.is_cancel())
    }

    /// Registers a listener invoked when the group resolves, whatever the
    /// outcome. Triggers an aggregate re-evaluation, which is a no-op while
    /// the group is not ready.
    pub fn add_listener(
        &self,
        listener: impl FnOnce(&FutureGroup) + Send + 'static,
    ) -> &FutureGroup {
        self.lock().complete.push(Box::new(listener));
        if self.debug_enabled() {
            trace!("listener added", { group_id: self.inner.id.0 });
        }
        self.member_completed();
        self
    }

    /// Registers a listener invoked when every member succeeded.
    ///
    /// Fires immediately if that aggregate condition already holds.
    pub fn add_success_listener(
        &self,
        listener: impl FnOnce(&FutureGroup) + Send + 'static,
    ) -> &FutureGroup {
        self.lock().success.push(Box::new(listener));
        if self.debug_enabled() {
            trace!("success listener added", { group_id: self.inner.id.0 });
        }
        if self.is_success() {
            self.trigger_success();
        }
        self
    }

    /// Registers a listener invoked when the group resolves with at least
    /// one errored member.
    ///
    /// The listener receives the last fault in member order and the full
    /// ordered fault list. Fires immediately if the condition already holds.
    pub fn add_error_listener(
        &self,
        listener: impl FnOnce(&FutureGroup, &Fault, &[Fault]) + Send + 'static,
    ) -> &FutureGroup {
        self.lock().error.push(Box::new(listener));
        if self.debug_enabled() {
            trace!("error listener added", { group_id: self.inner.id.0 });
        }
        if self.is_error() {
            self.trigger_error();
        }
        self
    }

    /// Registers a listener invoked when the group resolves with at least
    /// one cancelled member and no errored member.
    ///
    /// Fires immediately if the condition already holds.
    pub fn add_cancel_listener(
        &self,
        listener: impl FnOnce(&FutureGroup) + Send + 'static,
    ) -> &FutureGroup {
        self.lock().cancel.push(Box::new(listener));
        if self.debug_enabled() {
            trace!("cancel listener added", { group_id: self.inner.id.0 });
        }
        if self.is_cancel() {
            self.trigger_cancel();
        }
        self
    }

    /// Flushes every member future.
    ///
    /// Returns `false` and does nothing if the group has no members. The
    /// group's own listener queues and state are left untouched.
    pub fn flush(&self) -> bool {
        let members = self.futures();
        if members.is_empty() {
            return false;
        }
        for future in &members {
            future.flush();
        }
        if self.debug_enabled() {
            trace!("members flushed", { group_id: self.inner.id.0 });
        }
        true
    }

    /// Re-evaluates aggregate completion after a member resolved.
    ///
    /// Called by member futures on every dispatch, by `mark_ready` and by
    /// complete-listener registration. Does nothing before readiness. At
    /// most one of the three dispatches can fire per evaluation: their
    /// predicates are disjoint, with cancel explicitly yielding to error.
    pub(crate) fn member_completed(&self) {
        {
            let state = self.lock();
            if !state.ready {
                return;
            }
        }
        self.dump_status();
        self.trigger_success();
        self.trigger_error();
        self.trigger_cancel();
    }

    /// Readiness transition taken by the debounce timer.
    ///
    /// A timer superseded by a later addition carries a stale epoch and is
    /// ignored, even if it already woke up before its handle was dropped.
    fn debounce_fired(&self, epoch: u64) {
        {
            let mut state = self.lock();
            if state.timer_epoch != epoch || state.ready {
                return;
            }
            state.timer = None;
            state.ready = true;
        }
        if self.debug_enabled() {
            trace!("ready", { group_id: self.inner.id.0 });
        }
        self.member_completed();
    }

    /// Supersedes the outstanding debounce timer with a fresh one.
    fn reschedule_debounce(&self, state: &mut GroupState) {
        state.timer_epoch += 1;
        state.timer = None;
        if state.ready_delay > Duration::from_millis(0) {
            state.timer = Some(Debounce::schedule(
                self.downgrade(),
                state.timer_epoch,
                state.ready_delay,
            ));
        }
    }

    fn trigger_success(&self) {
        if !self.is_success() {
            return;
        }
        let (success, complete) = {
            let mut state = self.lock();
            (state.success.drain(), state.complete.drain())
        };
        if self.debug_enabled() {
            trace!("success dispatched", { group_id: self.inner.id.0 });
        }
        for listener in success {
            listener(self);
        }
        for listener in complete {
            listener(self);
        }
    }

    fn trigger_error(&self) {
        if !self.is_error() {
            return;
        }
        let errors = self.errors();
        let last = match errors.last() {
            Some(fault) => fault.clone(),
            None => Fault::unspecified(),
        };
        let (error, complete) = {
            let mut state = self.lock();
            (state.error.drain(), state.complete.drain())
        };
        if self.debug_enabled() {
            trace!("error dispatched", {
                group_id: self.inner.id.0,
                errors: errors.len() as u64,
            });
        }
        for listener in error {
            listener(self, &last, &errors);
        }
        for listener in complete {
            listener(self);
        }
    }

    fn trigger_cancel(&self) {
        if self.is_error() || !self.is_cancel() {
            return;
        }
        let (cancel, complete) = {
            let mut state = self.lock();
            (state.cancel.drain(), state.complete.drain())
        };
        if self.debug_enabled() {
            trace!("cancel dispatched", { group_id: self.inner.id.0 });
        }
        for listener in cancel {
            listener(self);
        }
        for listener in complete {
            listener(self);
        }
    }

    /// Logs every member's state at trace level. No-op unless debugging.
    fn dump_status(&self) {
        if !self.debug_enabled() {
            return;
        }
        for future in self.futures() {
            trace!("member status", {
                group_id: self.inner.id.0,
                future_id: future.id().0,
                state: future.state().name(),
            });
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> FutureGroup {
        FutureGroup { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Arc::downgrade(&self.inner)
    }

    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.inner.state.lock().unwrap()
    }

    fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed) && log_enabled!(log::Level::Trace)
    }
}

impl Default for FutureGroup {
    fn default() -> FutureGroup {
        FutureGroup::new()
    }
}

impl fmt::Debug for FutureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (ready, members) = {
            let state = self.lock();
            (state.ready, state.members.len())
        };
        f.debug_struct("FutureGroup")
            .field("id", &self.inner.id)
            .field("ready", &ready)
            .field("members", &members)
            .finish()
    }
}
