//! Calls, bindings, closures and recursion.

use super::*;

#[test]
fn test_calling_functions_without_arguments() {
    assert_cases(&[
        ("var fiveplusten = def() { 5 + 10; }; fiveplusten()", Val::Int(15)),
        (
            "var one = def() { 1; }; var two = def() { 2; }; one() + two()",
            Val::Int(3),
        ),
        (
            "var a = def() { 1 }; var b = def() { a() + 1 }; var c = def() { b() + 1 }; c();",
            Val::Int(3),
        ),
        (
            "var returnsone = def() { 1; }; var returnsonereturner = def() { returnsone; }; returnsonereturner()();",
            Val::Int(1),
        ),
    ]);
}

#[test]
fn test_functions_with_return_statement() {
    assert_cases(&[
        ("var earlyexit = def() { return 99; 100; }; earlyexit();", Val::Int(99)),
        (
            "var earlyexit = def() { return 99; return 100; }; earlyexit();",
            Val::Int(99),
        ),
    ]);
}

#[test]
fn test_functions_without_return_value() {
    assert_cases(&[
        ("var noreturn = def() {}; noreturn();", Val::Null),
        (
            "var noreturn = def() {}; var noreturntwo = def() { noreturn(); }; noreturn(); noreturntwo();",
            Val::Null,
        ),
    ]);
}

#[test]
fn test_calling_functions_with_bindings() {
    assert_cases(&[
        ("var one = def() { var one = 1; one }; one();", Val::Int(1)),
        (
            "var oneandtwo = def() { var one = 1; var two = 2; one + two; }; oneandtwo();",
            Val::Int(3),
        ),
        (
            "var oneandtwo = def() { var one = 1; var two = 2; one + two; };\n             var threeandfour = def() { var three = 3; var four = 4; three + four; };\n             oneandtwo() + threeandfour();",
            Val::Int(10),
        ),
        (
            "var firstfoobar = def() { var foobar = 50; foobar; };\n             var secondfoobar = def() { var foobar = 100; foobar; };\n             firstfoobar() + secondfoobar();",
            Val::Int(150),
        ),
        (
            "var globalseed = 50;\n             var minusone = def() { var num = 1; globalseed - num; }\n             var minustwo = def() { var num = 2; globalseed - num; }\n             minusone() + minustwo();",
            Val::Int(97),
        ),
    ]);
}

#[test]
fn test_calling_functions_with_arguments_and_bindings() {
    assert_cases(&[
        ("var identity = def(a) { a; }; identity(4);", Val::Int(4)),
        ("var sum = def(a, b) { a + b; }; sum(1, 2);", Val::Int(3)),
        (
            "var sum = def(a, b) { var c = a + b; c; }; sum(1, 2);",
            Val::Int(3),
        ),
        (
            "var sum = def(a, b) { var c = a + b; c; }; sum(1, 2) + sum(3, 4);",
            Val::Int(10),
        ),
        (
            "var sum = def(a, b) { var c = a + b; c; }; var outer = def() { sum(1, 2) + sum(3, 4); }; outer();",
            Val::Int(10),
        ),
    ]);
}

#[test]
fn test_arguments_evaluate_left_to_right_before_the_call() {
    let last = run_val(
        "var n = 0\n         var bump = def(v) { n = n + v; v }\n         var probe = def(a, b) { n }\n         probe(bump(1), bump(2))",
    );
    assert_eq!(last, Val::Int(3));
}

#[test]
fn test_calling_functions_with_wrong_arguments() {
    let cases = [
        ("def() { 1; }(1)", "Wrong number of arguments. Expected 0, got 1"),
        ("def(a) { a; }();", "Wrong number of arguments. Expected 1, got 0"),
        ("def(a, b) { a + b; }(1);", "Wrong number of arguments. Expected 2, got 1"),
    ];
    for (input, expected) in cases {
        assert_eq!(run_err(input), expected, "input: {}", input);
    }
}

#[test]
fn test_closures() {
    assert_cases(&[
        (
            "var newclosure = def(a) { def() { a; }; }; var closure = newclosure(99); closure();",
            Val::Int(99),
        ),
        (
            "var newadder = def(a, b) { def(c) { a + b + c }; }; var adder = newadder(1, 2); adder(8);",
            Val::Int(11),
        ),
        (
            "var newadder = def(a, b) { var c = a + b; def(d) { c + d } }; var adder = newadder(1, 2); adder(8)",
            Val::Int(11),
        ),
        (
            "var newadderouter = def(a, b) { var c = a + b; def(d) { var e = d + c; def(f) { e + f; }; }; };\n             var newadderinner = newadderouter(1, 2); var adder = newadderinner(3); adder(8);",
            Val::Int(14),
        ),
        (
            "var a = 1; var newadderouter = def(b) { def(c) { def(d) { a + b + c + d }; }; };\n             var newadderinner = newadderouter(2); var adder = newadderinner(3); adder(8);",
            Val::Int(14),
        ),
        (
            "var newclosure = def(a, b) { var one = def() { a; }; var two = def() { b; }; def() { one() + two(); }; };\n             var closure = newclosure(9, 90); closure();",
            Val::Int(99),
        ),
    ]);
}

#[test]
fn test_closure_composition_is_additive() {
    assert_eq!(run_val("def(a){ def(){ a } }(99)()"), Val::Int(99));
    assert_eq!(run_val("def(a){ def(b){ def(){ a + b } } }(1)(2)()"), Val::Int(3));
    assert_eq!(
        run_val("def(a){ def(b){ def(c){ def(){ a + b + c } } } }(1)(2)(3)()"),
        Val::Int(6)
    );
}

#[test]
fn test_closures_capture_aliases_not_copies() {
    // The captured array is the same storage the outer binding holds.
    let last = run_val(
        "var xs = [1]\n         var reader = def() { xs }\n         reader() == xs",
    );
    assert_eq!(last, Val::Bool(true));
}

#[test]
fn test_recursive_functions() {
    assert_cases(&[
        (
            "var countdown = def(x) { if (x == 0) { return 0; } el { countdown(x - 1) } }; countdown(9);",
            Val::Int(0),
        ),
        (
            "var wrapper = def() {\n               var countdown = def(x) { if (x == 0) { return 0 } el { countdown(x - 1) } }\n               countdown(9)\n             }\n             wrapper()",
            Val::Int(0),
        ),
        (
            "var fact = def(n) { if (n <= 1) { 1 } el { n * fact(n - 1) } }; fact(5)",
            Val::Int(120),
        ),
        (
            "var fib = def(n) { if (n < 2) { n } el { fib(n - 1) + fib(n - 2) } }; fib(10)",
            Val::Int(55),
        ),
    ]);
}

#[test]
fn test_trailing_block_becomes_last_argument() {
    assert_eq!(
        run_val("var call = def(cb) { cb() }; call() { 41 + 1 }"),
        Val::Int(42)
    );
    assert_eq!(
        run_val("var wrap = def(x, cb) { x + cb() }; wrap(40) { 2 }"),
        Val::Int(42)
    );
}

#[test]
fn test_return_outside_function_is_fatal() {
    assert_eq!(run_err("return 5"), "Return outside of a function");
}
