//! Error values, the pipe/unblock gates, and fatal failures.

use super::*;

#[test]
fn test_error_pipe_assigns_error_to_variable() {
    let last = run_val("var x = def() { return y }; var z = << x(); z");
    match &last {
        Val::Error(err) => assert!(err.message.contains("Undefined variable y"), "got: {}", err.message),
        other => panic!("expected Error, got {:?}", other),
    }
}

#[test]
fn test_error_pipe_on_success_yields_null() {
    assert_eq!(run_val("var f = def() { 5 }; var z = << f(); z"), Val::Null);
    assert_eq!(run_val("<< 5"), Val::Null);
    assert_eq!(run_val("<< \"fine\""), Val::Null);
}

#[test]
fn test_unblock_let_swallows_error() {
    assert_eq!(run_val("var f = def() { return y }; unblock var x = f(); x"), Val::Null);
    assert_eq!(run_val("var f = def() { 7 }; unblock var x = f(); x"), Val::Int(7));
}

#[test]
fn test_unblock_with_error_pipe_assigns_error() {
    // Error pipe wins when both modifiers are present.
    let last = run_val("var f = def() { return y }; unblock var z = << f(); z");
    assert!(matches!(last, Val::Error(_)), "expected Error, got {:?}", last);
}

#[test]
fn test_error_values_flow_without_short_circuit() {
    // An Error is data: it can sit in containers and come back out.
    let last = run_val("var f = def() { return y }; var e = << f(); [e][0]");
    assert!(matches!(last, Val::Error(_)));

    let last = run_val(r#"var f = def() { return y }; var e = << f(); {"k": e}.k"#);
    assert!(matches!(last, Val::Error(_)));
}

#[test]
fn test_is_error_peeks_without_consuming() {
    // `<< E` leaves the error itself; a second pipe still sees it.
    let last = run_val("var f = def() { return y }; var e = << f(); var e2 = << e; e2");
    assert!(matches!(last, Val::Error(_)));
}

#[test]
fn test_error_is_truthy_data() {
    assert_eq!(
        run_val("var f = def() { return y }; var e = << f(); if (e) { 1 } el { 2 }"),
        Val::Int(1)
    );
}

#[test]
fn test_deferred_global_reads_back_as_error() {
    // The host seeds the auto-defined slot, so a later read yields the
    // positioned error value rather than null.
    let last = run_val("var f = def() { ghost }; f()");
    let Val::Error(err) = &last else {
        panic!("expected Error, got {:?}", last);
    };
    assert!(err.message.contains("Undefined variable ghost"));
    assert!(err.line >= 1 && err.column >= 1);
}

#[test]
fn test_runtime_errors() {
    assert_eq!(run_err("1 / 0"), "Division by zero");
    assert_eq!(run_err("1 % 0"), "Modulo by zero");
    assert_eq!(run_err("'1 / '0"), "Division by zero");
    assert_eq!(run_err("5 + true"), "Unsupported types for binary operation: INTEGER BOOLEAN");
    assert_eq!(run_err("\"a\" - \"b\""), "Unknown string operator: OpSub");
    assert_eq!(run_err("-true"), "Unsupported type for negation: BOOLEAN");
    assert_eq!(run_err("5(1)"), "Calling non-function and non-builtin function.");
    assert_eq!(run_err("1[0]"), "Index operator not supported: INTEGER");
    assert_eq!(run_err("{[1]: 2}"), "unusable as hash key: ARRAY");
    assert_eq!(run_err("{}[[1]]"), "Unusable as hash key: ARRAY");
    assert_eq!(run_err("5.key"), "Dot operator not supported: INTEGER");
    assert_eq!(run_err("'1 > '2"), "Unknown operator: OpGreaterThan (FLOAT FLOAT)");
}

#[test]
fn test_stack_overflow_is_fatal() {
    let err = run_err("var f = def() { f() }; f()");
    assert_eq!(err, "STACK OVERFLOW");
}
