//! Runs the pipelines of the build-time generated dispatch module.
//!
//! The journal is per thread and every test runs on its own thread, so tests
//! never see each other's entries.

use futures::executor::block_on;
use switchyard_e2e::app::{take_journal, Unreachable};
use switchyard_e2e::{routes, run};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn routes_table_follows_model_order() {
    assert_eq!(routes(), &["deploy {env}", "status", "version", "rollback"]);
}

#[test]
fn success_runs_before_in_order_and_after_in_reverse() {
    take_journal();
    block_on(run(0, &args(&["prod"]))).unwrap();

    assert_eq!(
        take_journal(),
        vec![
            "before(Logging) deploy {env}",
            "before(Timing) staging",
            "handler(deploy prod)",
            "after(Timing) timed=true",
            "after(Logging)",
        ]
    );
}

#[test]
fn handler_failure_sweeps_error_hooks_and_reraises() {
    take_journal();
    let err = block_on(run(0, &args(&["moon"]))).unwrap_err();

    let unreachable = err.downcast_ref::<Unreachable>().unwrap();
    assert_eq!(unreachable.0, "moon");
    assert_eq!(
        take_journal(),
        vec![
            "before(Logging) deploy {env}",
            "before(Timing) staging",
            "handler(deploy moon)",
            "error(Timing, deploy target unreachable: moon)",
            "error(Logging, deploy target unreachable: moon)",
        ]
    );
}

#[test]
fn route_without_filter_gets_every_behavior() {
    take_journal();
    block_on(run(1, &[])).unwrap();

    assert_eq!(
        take_journal(),
        vec![
            "before(Logging) status",
            "before(Timing) staging",
            "before(Audit) crate::app::StatusHandler",
            "handler(status)",
            "after(Audit)",
            "after(Timing) timed=true",
            "after(Logging)",
        ]
    );
}

#[test]
fn empty_behavior_list_runs_handler_only() {
    take_journal();
    block_on(run(2, &[])).unwrap();
    assert_eq!(take_journal(), vec!["handler(status)"]);
}

#[test]
fn route_without_handler_fails_through_its_behaviors() {
    take_journal();
    let err = block_on(run(3, &[])).unwrap_err();

    assert_eq!(err.to_string(), "no handler registered for route `rollback`");
    assert_eq!(
        take_journal(),
        vec![
            "before(Logging) rollback",
            "error(Logging, no handler registered for route `rollback`)",
        ]
    );
}

#[test]
fn unknown_index_is_an_error() {
    take_journal();
    let err = block_on(run(9, &[])).unwrap_err();
    assert_eq!(err.to_string(), "no route with index 9");
    assert!(take_journal().is_empty());
}

#[test]
fn state_is_fresh_per_invocation() {
    take_journal();
    block_on(run(0, &args(&["prod"]))).unwrap();
    block_on(run(0, &args(&["moon"]))).unwrap_err();
    block_on(run(0, &args(&["prod"]))).unwrap();

    let journal = take_journal();
    assert_eq!(journal.iter().filter(|e| e.starts_with("after(Timing)")).count(), 2);
    assert_eq!(journal.iter().filter(|e| e.starts_with("error(Timing")).count(), 1);
}
