//! The debug/trace mode is purely observational: enabling it changes no
//! observable behavior.

use future_group::{Future, FutureGroup};

#[test]
fn tracing_is_purely_observational() {
    femme::with_level(log::LevelFilter::Trace);

    let future = Future::new();
    future.enable_debug();
    future.add_listener(|_| {});
    future.succeed().unwrap();
    assert!(future.is_success());

    let group = FutureGroup::new();
    group.enable_debug().disable_auto_ready();
    group.add_predicate(|| true).unwrap();
    group.add_predicate(|| false).unwrap();
    group.mark_ready();

    assert!(group.is_error());
    assert_eq!(group.errors().len(), 1);
}
