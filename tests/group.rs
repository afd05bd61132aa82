use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use future_group::{Future, FutureGroup, Member};

/// A group with the debounce disabled, made ready explicitly by each test.
fn quiet_group() -> FutureGroup {
    let group = FutureGroup::new();
    group.disable_auto_ready();
    group
}

#[test]
fn empty_group_never_completes() {
    let group = quiet_group();
    assert!(!group.is_completed());

    group.mark_ready();
    assert!(!group.is_completed());
    assert!(!group.is_success());
    assert!(!group.is_error());
    assert!(!group.is_cancel());
}

#[test]
fn success_dispatch_waits_for_ready() {
    let group = quiet_group();
    let first = group.new_future().unwrap();
    let second = group.new_future().unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    group.add_success_listener(move |group| {
        assert!(group.futures().iter().all(|f| f.is_success()));
        count.fetch_add(1, Ordering::SeqCst);
    });

    first.succeed().unwrap();
    second.succeed().unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    group.mark_ready();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(group.is_success());

    // Re-marking ready re-evaluates but the queues are already drained.
    group.mark_ready();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn completion_queries_ignore_readiness() {
    let group = quiet_group();
    let member = group.new_future().unwrap();
    member.succeed().unwrap();

    assert!(group.is_completed());
    assert!(group.is_success());
}

#[test]
fn add_after_ready_is_rejected() {
    let group = quiet_group();
    group.new_future().unwrap();
    group.mark_ready();

    assert!(group.new_future().is_err());
    assert!(group.add(Future::new()).is_err());
    assert!(group.add_predicate(|| true).is_err());
    assert_eq!(group.futures().len(), 1);
}

#[test]
fn cancelled_member_without_errors_dispatches_cancel() {
    let group = quiet_group();
    let first = group.new_future().unwrap();
    let second = group.new_future().unwrap();

    let cancels = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let count = cancels.clone();
    group.add_cancel_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    let count = errors.clone();
    group.add_error_listener(move |_, _, _| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    group.mark_ready();

    first.succeed().unwrap();
    second.cancel().unwrap();

    assert!(group.is_cancel());
    assert!(!group.is_error());
    assert_eq!(cancels.load(Ordering::SeqCst), 1);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
}

#[test]
fn error_takes_precedence_over_cancel() {
    let group = quiet_group();
    let first = group.new_future().unwrap();
    let second = group.new_future().unwrap();

    let cancels = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let count = cancels.clone();
    group.add_cancel_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    let count = errors.clone();
    group.add_error_listener(move |_, _, _| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    group.mark_ready();

    first.fail("boom").unwrap();
    second.cancel().unwrap();

    // Both aggregate predicates hold, but only the error path notifies.
    assert!(group.is_error());
    assert!(group.is_cancel());
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(cancels.load(Ordering::SeqCst), 0);
}

#[test]
fn error_listener_receives_last_and_all_faults() {
    let group = quiet_group();
    let first = group.new_future().unwrap();
    let second = group.new_future().unwrap();
    let third = group.new_future().unwrap();

    let seen = Arc::new(Mutex::new(None));
    let slot = seen.clone();
    group.add_error_listener(move |_, last, all| {
        let all: Vec<String> = all.iter().map(|f| f.message().to_string()).collect();
        *slot.lock().unwrap() = Some((last.message().to_string(), all));
    });
    group.mark_ready();

    first.fail("first fault").unwrap();
    second.succeed().unwrap();
    third.fail("second fault").unwrap();

    let (last, all) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(last, "second fault");
    assert_eq!(all, ["first fault", "second fault"]);

    assert_eq!(group.error_futures().len(), 2);
    let errors: Vec<String> = group.errors().iter().map(|f| f.message().to_string()).collect();
    assert_eq!(errors, ["first fault", "second fault"]);
}

#[test]
fn predicate_true_is_instant_success() {
    let group = quiet_group();
    group.add_predicate(|| true).unwrap();

    let members = group.futures();
    assert_eq!(members.len(), 1);
    assert!(members[0].is_success());
}

#[test]
fn predicate_false_errors_with_message() {
    let group = quiet_group();
    group.add_predicate(|| false).unwrap();

    let member = &group.futures()[0];
    assert!(member.is_error());
    assert_eq!(member.error().unwrap().message(), "Closure returned false!");
}

#[test]
fn predicate_panic_becomes_member_fault() {
    let group = quiet_group();
    group.add_predicate(|| panic!("kaput")).unwrap();

    let member = &group.futures()[0];
    assert!(member.is_error());
    assert_eq!(member.error().unwrap().message(), "kaput");

    // A faulty predicate does not poison the group.
    group.add_predicate(|| true).unwrap();
    assert_eq!(group.futures().len(), 2);
}

#[test]
fn member_enum_wraps_futures_and_predicates() {
    let group = quiet_group();
    group.add(Member::predicate(|| true)).unwrap();
    group.add(Member::from(Future::new())).unwrap();
    assert_eq!(group.futures().len(), 2);
}

#[test]
fn external_future_binds_to_group() {
    let group = quiet_group();
    let future = Future::new();
    group.add(future.clone()).unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    group.add_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    group.mark_ready();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    future.succeed().unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn late_group_listeners_fire_at_registration() {
    let group = quiet_group();
    let member = group.new_future().unwrap();
    member.succeed().unwrap();
    group.mark_ready();

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    group.add_success_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let count = fired.clone();
    group.add_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn listener_may_resolve_another_member() {
    let group = quiet_group();
    let first = group.new_future().unwrap();
    let second = group.new_future().unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    group.add_success_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
    });

    let chained = second.clone();
    first.add_success_listener(move |_| {
        chained.succeed().unwrap();
    });
    group.mark_ready();

    first.succeed().unwrap();
    assert!(first.is_success() && second.is_success());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn flush_cascades_to_members() {
    let group = quiet_group();
    let member = group.new_future().unwrap();

    assert!(group.flush());
    assert!(member.succeed().is_ok());
    assert!(!member.is_completed());
}

#[test]
fn group_listener_may_flush_the_group() {
    let group = quiet_group();
    let member = group.new_future().unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let count = fired.clone();
    let handle = group.clone();
    group.add_listener(move |_| {
        count.fetch_add(1, Ordering::SeqCst);
        assert!(handle.flush());
    });
    group.mark_ready();
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    member.succeed().unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // The cascade reached the member: it is inert from here on.
    assert!(member.fail("late").is_ok());
    assert!(!member.is_completed());
    assert!(member.error().is_none());
}

#[test]
fn flush_on_empty_group_returns_false() {
    assert!(!quiet_group().flush());
}

#[test]
fn group_ids_are_unique() {
    let a = FutureGroup::new();
    let b = FutureGroup::new();
    assert_ne!(a.id(), b.id());
}
