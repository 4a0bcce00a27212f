//! Values, operators and containers.

use super::*;

#[test]
fn test_integer_arithmetic() {
    assert_cases(&[
        ("1", Val::Int(1)),
        ("2", Val::Int(2)),
        ("1 + 2", Val::Int(3)),
        ("1 - 2", Val::Int(-1)),
        ("1 * 2", Val::Int(2)),
        ("4 / 2", Val::Int(2)),
        ("50 / 2 * 2 + 10 - 5", Val::Int(55)),
        ("5 + 5 + 5 + 5 - 10", Val::Int(10)),
        ("2 * 2 * 2 * 2 * 2", Val::Int(32)),
        ("5 * 2 + 10", Val::Int(20)),
        ("5 + 2 * 10", Val::Int(25)),
        ("5 * (2 + 10)", Val::Int(60)),
        ("-5", Val::Int(-5)),
        ("-50 + 100 + -50", Val::Int(0)),
        ("(5 + 10 * 2 + 15 / 3) * 2 + -10", Val::Int(50)),
        ("7 % 3", Val::Int(1)),
        ("10 % 2", Val::Int(0)),
    ]);
}

#[test]
fn test_float_arithmetic_and_widening() {
    assert_cases(&[
        ("'1", Val::Float(1.0)),
        ("'1.123", Val::Float(1.123)),
        ("'12.69", Val::Float(12.69)),
        ("'1.40000", Val::Float(1.4)),
        ("'1 + '1", Val::Float(2.0)),
        ("'3 - '2", Val::Float(1.0)),
        ("'2.5 * '2", Val::Float(5.0)),
        ("'7 / '2", Val::Float(3.5)),
        ("12.5", Val::Float(12.5)),
        // Any float participant widens the other side.
        ("1 + '2", Val::Float(3.0)),
        ("'1 + 2", Val::Float(3.0)),
        ("2 * '1.5", Val::Float(3.0)),
        ("'5 % 2", Val::Float(1.0)),
        ("-'2.5", Val::Float(-2.5)),
    ]);
}

#[test]
fn test_arithmetic_identities() {
    for a in [-7i64, 0, 1, 42, 9999] {
        assert_eq!(run_val(&format!("{} + 0", a)), Val::Int(a));
        assert_eq!(run_val(&format!("{} * 1", a)), Val::Int(a));
    }
    // Integer division truncates toward zero.
    assert_eq!(run_val("7 / 2"), Val::Int(3));
    assert_eq!(run_val("-7 / 2"), Val::Int(-3));
}

#[test]
fn test_boolean_expressions() {
    assert_cases(&[
        ("true", Val::Bool(true)),
        ("false", Val::Bool(false)),
        ("1 < 2", Val::Bool(true)),
        ("1 > 2", Val::Bool(false)),
        ("1 < 1", Val::Bool(false)),
        ("1 > 1", Val::Bool(false)),
        ("1 <= 1", Val::Bool(true)),
        ("2 <= 1", Val::Bool(false)),
        ("1 >= 1", Val::Bool(true)),
        ("1 >= 2", Val::Bool(false)),
        ("1 == 1", Val::Bool(true)),
        ("1 != 1", Val::Bool(false)),
        ("1 == 2", Val::Bool(false)),
        ("1 != 2", Val::Bool(true)),
        ("\"hello\" == \"hello\"", Val::Bool(true)),
        ("\"hello\" != \"hello\"", Val::Bool(false)),
        ("\"b\" > \"a\"", Val::Bool(true)),
        ("\"a\" < \"b\"", Val::Bool(true)),
        ("true == true", Val::Bool(true)),
        ("false == false", Val::Bool(true)),
        ("true == false", Val::Bool(false)),
        ("true != false", Val::Bool(true)),
        ("(1 < 2) == true", Val::Bool(true)),
        ("(1 > 2) == false", Val::Bool(true)),
        ("!true", Val::Bool(false)),
        ("!false", Val::Bool(true)),
        ("!5", Val::Bool(false)),
        ("!null", Val::Bool(true)),
        ("!!true", Val::Bool(true)),
        ("!!5", Val::Bool(true)),
        ("!(if (false) { 5; })", Val::Bool(true)),
        ("true and true", Val::Bool(true)),
        ("true and false", Val::Bool(false)),
        ("false or true", Val::Bool(true)),
        ("false or false", Val::Bool(false)),
        ("null or 1", Val::Bool(true)),
        ("null and 1", Val::Bool(false)),
    ]);
}

#[test]
fn test_float_equality_is_identity_based() {
    // Floats are not an ordered comparison pair; equality falls back to
    // identity, which two distinct float values never satisfy.
    assert_eq!(run_val("'1 == '1"), Val::Bool(false));
    assert_eq!(run_val("'1 != '1"), Val::Bool(true));
    // Mixed-kind equality is always false.
    assert_eq!(run_val("1 == \"1\""), Val::Bool(false));
    assert_eq!(run_val("1 == '1"), Val::Bool(false));
}

#[test]
fn test_string_expressions() {
    assert_cases(&[
        (r#""monkey""#, Val::string("monkey")),
        (r#""mon" + "key""#, Val::string("monkey")),
        (r#""mon" + "key" + "banana""#, Val::string("monkeybanana")),
        ("`multi\nline` + \"!\"", Val::string("multi\nline!")),
    ]);
}

#[test]
fn test_global_let_statements() {
    assert_cases(&[
        ("var one = 1; one", Val::Int(1)),
        ("var one = 1; var two = 2; one + two", Val::Int(3)),
        ("var one = 1; var two = one + one; one + two", Val::Int(3)),
    ]);
}

#[test]
fn test_let_statement_result_is_suppressed() {
    assert_eq!(run("var a = 1").unwrap(), None);
    assert_eq!(run("var a = def() { 1 }").unwrap(), None);
    assert_eq!(run("suppress 1 + 2").unwrap(), None);
    assert_eq!(run("suppress var a = 3").unwrap(), None);
}

#[test]
fn test_assignment_expression_statement_keeps_previous_value() {
    // `a = 2` as an expression statement loads the old value of `a` before
    // storing; the statement's displayed result is that previous value.
    assert_eq!(run("var a = 1; a = 2").unwrap(), Some(Val::Int(1)));
    assert_eq!(run_val("var a = 1; a = 2; a"), Val::Int(2));
}

#[test]
fn test_array_literals() {
    assert_cases(&[
        ("[]", Val::array(vec![])),
        ("[1, 2, 3]", Val::array(vec![Val::Int(1), Val::Int(2), Val::Int(3)])),
        (
            "[1 + 2, 3 * 4, 5 + 6]",
            Val::array(vec![Val::Int(3), Val::Int(12), Val::Int(11)]),
        ),
        (
            "[[1, 2], [3]]",
            Val::array(vec![
                Val::array(vec![Val::Int(1), Val::Int(2)]),
                Val::array(vec![Val::Int(3)]),
            ]),
        ),
    ]);
}

#[test]
fn test_hash_literals() {
    assert_eq!(run_val("{}").inspect(), "{}");
    assert_eq!(run_val("{1: 2, 2: 3}").inspect(), "{1: 2, 2: 3}");
    assert_eq!(run_val("{1 + 1: 2 * 2, 3 + 3: 4 * 4}").inspect(), "{2: 4, 6: 16}");
    // Duplicate keys silently overwrite.
    assert_eq!(run_val(r#"{"k": 1, "k": 2}["k"]"#), Val::Int(2));
    // Bool and string keys coexist.
    assert_eq!(run_val(r#"{true: "t", "s": 2}[true]"#), Val::string("t"));
}

#[test]
fn test_index_expressions() {
    assert_cases(&[
        ("[1, 2, 3][1]", Val::Int(2)),
        ("[1, 2, 3][0 + 2]", Val::Int(3)),
        ("[[1, 1, 1]][0][0]", Val::Int(1)),
        ("[][0]", Val::Null),
        ("[1, 2, 3][99]", Val::Null),
        ("[1][-1]", Val::Null),
        ("{1: 1, 2: 2}[1]", Val::Int(1)),
        ("{1: 1, 2: 2}[2]", Val::Int(2)),
        ("{1: 1}[0]", Val::Null),
        ("{}[0]", Val::Null),
        (r#"{"a": 1}["a"]"#, Val::Int(1)),
    ]);
}

#[test]
fn test_dot_access() {
    assert_cases(&[
        (r#"var h = {"a": 1, "b": 2}; h.a"#, Val::Int(1)),
        (r#"var h = {"a": 1}; h.missing"#, Val::Null),
        (r#"var h = {"nested": {"x": 9}}; h.nested.x"#, Val::Int(9)),
        // A parenthesized string on the right of the dot is a plain key.
        (r#"({"a": 1}).("a")"#, Val::Int(1)),
    ]);
}

#[test]
fn test_shared_container_mutation_visible_through_aliases() {
    // Arrays bind by reference: both names see the same storage.
    let last = run_val("var xs = [1]; var ys = xs; xs == ys");
    assert_eq!(last, Val::Bool(true));
    // Separately-built containers are distinct identities.
    assert_eq!(run_val("[1] == [1]"), Val::Bool(false));
    assert_eq!(run_val("{} == {}"), Val::Bool(false));
}
