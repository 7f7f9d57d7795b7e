//! Unit tests for dispatch errors.

use std::error::Error as _;

use super::*;

#[test]
fn messages_name_the_handler() {
    let err = DispatchError::UnknownHandler {
        name: "echo".into(),
    };
    assert_eq!(err.to_string(), "handler 'echo' is not registered");
}

#[test]
fn unresolvable_reports_candidate_count() {
    let err = DispatchError::Unresolvable { candidates: 2 };
    assert!(err.to_string().contains("2 tried"));
}

#[test]
fn handler_failure_chains_the_fault() {
    let err = DispatchError::HandlerFailed {
        fault: HandlerFault::new("boom"),
    };
    assert!(err.to_string().contains("boom"));
    let source = err.source().expect("fault source");
    assert_eq!(source.to_string(), "boom");
}
