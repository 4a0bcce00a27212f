use super::{Expr, Parser, Stmt};

fn parse_ok(input: &str) -> super::Program {
    let mut p = Parser::from_source(input);
    let program = p.parse_program();
    assert!(p.errors().is_empty(), "parser errors: {:?}", p.errors());
    program
}

#[test]
fn test_let_statement() {
    let program = parse_ok("var x = 5;");
    assert_eq!(program.statements.len(), 1);
    match &program.statements[0] {
        Stmt::Let {
            name,
            value,
            unblock,
            error_pipe,
            ..
        } => {
            assert_eq!(name.value, "x");
            assert!(matches!(value, Expr::Integer { value: 5, .. }));
            assert!(!unblock);
            assert!(!error_pipe);
        }
        other => panic!("expected let, got {:?}", other),
    }
}

#[test]
fn test_unblock_let_statement() {
    let program = parse_ok("unblock var x = 5;");
    match &program.statements[0] {
        Stmt::Let { unblock, value, .. } => {
            assert!(*unblock);
            assert!(matches!(value, Expr::Integer { value: 5, .. }));
        }
        other => panic!("expected let, got {:?}", other),
    }
}

#[test]
fn test_error_pipe_let_statement() {
    let program = parse_ok("var y = << func();");
    match &program.statements[0] {
        Stmt::Let {
            error_pipe, value, ..
        } => {
            assert!(*error_pipe);
            assert!(matches!(value, Expr::Call { .. }));
        }
        other => panic!("expected let, got {:?}", other),
    }
}

#[test]
fn test_unblock_with_error_pipe() {
    let program = parse_ok("unblock var y = << func();");
    match &program.statements[0] {
        Stmt::Let {
            unblock, error_pipe, ..
        } => {
            assert!(*unblock);
            assert!(*error_pipe);
        }
        other => panic!("expected let, got {:?}", other),
    }
}

#[test]
fn test_operator_precedence() {
    let cases = [
        ("-a * b", "((-a) * b)"),
        ("!-a", "(!(-a))"),
        ("a + b + c", "((a + b) + c)"),
        ("a * b / c", "((a * b) / c)"),
        ("a + b * c", "(a + (b * c))"),
        ("a % b + c", "((a % b) + c)"),
        ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
        ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))"),
        ("true == false and false", "((true == false) and false)"),
        ("a or b and c", "(a or (b and c))"),
        ("(5 + 5) * 2", "((5 + 5) * 2)"),
        ("a * [1, 2][1]", "(a * ([1, 2][1]))"),
        ("a <= b", "(a <= b)"),
        ("a >= b", "(a >= b)"),
    ];
    for (input, expected) in cases {
        let program = parse_ok(input);
        assert_eq!(program.to_string(), expected, "input: {}", input);
    }
}

#[test]
fn test_dot_rhs_becomes_string_literal() {
    let program = parse_ok("math.abs(1)");
    match &program.statements[0] {
        Stmt::Expression { expression, .. } => match expression {
            Expr::Call { function, .. } => match function.as_ref() {
                Expr::Dot { right, .. } => {
                    assert!(matches!(right.as_ref(), Expr::Str { value, .. } if value == "abs"));
                }
                other => panic!("expected dot, got {:?}", other),
            },
            other => panic!("expected call, got {:?}", other),
        },
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_if_elif_else_chain() {
    let program = parse_ok("if (a) { 1 } elif (b) { 2 } el { 3 }");
    match &program.statements[0] {
        Stmt::Expression { expression, .. } => match expression {
            Expr::If { alternative, .. } => {
                let alt = alternative.as_ref().expect("missing alternative");
                assert_eq!(alt.statements.len(), 1);
                // The elif is a nested if in the alternative block.
                match &alt.statements[0] {
                    Stmt::Expression { expression, .. } => {
                        assert!(matches!(expression, Expr::If { alternative: Some(_), .. }));
                    }
                    other => panic!("expected nested if, got {:?}", other),
                }
            }
            other => panic!("expected if, got {:?}", other),
        },
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_function_literal_gets_let_name() {
    let program = parse_ok("var addUp = def(a, b) { a + b }");
    match &program.statements[0] {
        Stmt::Let { value, .. } => match value {
            Expr::Function { name, parameters, .. } => {
                assert_eq!(name, "addUp");
                assert_eq!(parameters.len(), 2);
            }
            other => panic!("expected function, got {:?}", other),
        },
        other => panic!("expected let, got {:?}", other),
    }
}

#[test]
fn test_call_trailing_block() {
    let program = parse_ok("each([1, 2]) { 1 }");
    match &program.statements[0] {
        Stmt::Expression { expression, .. } => match expression {
            Expr::Call { arguments, block, .. } => {
                assert_eq!(arguments.len(), 1);
                assert!(block.is_some());
            }
            other => panic!("expected call, got {:?}", other),
        },
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_for_statement_full_header() {
    let program = parse_ok("for (var i = 0; i < 3; i = i + 1) { i }");
    match &program.statements[0] {
        Stmt::For {
            init,
            condition,
            update,
            ..
        } => {
            assert!(init.is_some());
            assert!(condition.is_some());
            assert!(update.is_some());
        }
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn test_for_statement_empty_header() {
    let program = parse_ok("for (;;) { break }");
    match &program.statements[0] {
        Stmt::For {
            init,
            condition,
            update,
            body,
            ..
        } => {
            assert!(init.is_none());
            assert!(condition.is_none());
            assert!(update.is_none());
            assert!(matches!(body.statements[0], Stmt::Break { .. }));
        }
        other => panic!("expected for, got {:?}", other),
    }
}

#[test]
fn test_while_without_condition_loops_forever() {
    let program = parse_ok("while { break }");
    match &program.statements[0] {
        Stmt::While { condition, .. } => {
            assert!(matches!(condition, Expr::Boolean { value: true, .. }));
        }
        other => panic!("expected while, got {:?}", other),
    }
}

#[test]
fn test_suppress_wraps_let_and_expression() {
    let program = parse_ok("suppress var x = 1\nsuppress 1 + 2");
    assert_eq!(program.statements.len(), 2);
    match &program.statements[0] {
        Stmt::Suppress { inner, .. } => assert!(matches!(inner.as_ref(), Stmt::Let { .. })),
        other => panic!("expected suppress, got {:?}", other),
    }
    match &program.statements[1] {
        Stmt::Suppress { inner, .. } => assert!(matches!(inner.as_ref(), Stmt::Expression { .. })),
        other => panic!("expected suppress, got {:?}", other),
    }
}

#[test]
fn test_block_directive_wraps_let() {
    let program = parse_ok("block var x = f()");
    match &program.statements[0] {
        Stmt::BlockDirective { inner, .. } => assert!(matches!(inner.as_ref(), Stmt::Let { .. })),
        other => panic!("expected block directive, got {:?}", other),
    }
}

#[test]
fn test_hash_literal() {
    let program = parse_ok(r#"{"one": 1, "two": 2}"#);
    match &program.statements[0] {
        Stmt::Expression { expression, .. } => match expression {
            Expr::Hash { pairs, .. } => assert_eq!(pairs.len(), 2),
            other => panic!("expected hash, got {:?}", other),
        },
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_prefix_error_pipe_expression() {
    let program = parse_ok("<< f()");
    match &program.statements[0] {
        Stmt::Expression { expression, .. } => {
            assert!(matches!(expression, Expr::Prefix { operator, .. } if operator == "<<"));
        }
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_parse_errors_have_positions_and_context() {
    let mut p = Parser::from_source("var = 5;");
    p.parse_program();
    assert!(!p.errors().is_empty());
    let msg = &p.errors()[0];
    assert!(msg.contains("line 1"), "got: {}", msg);
    assert!(msg.contains('^'), "expected caret context, got: {}", msg);
}

#[test]
fn test_well_formed_programs_have_no_errors() {
    let sources = [
        "var a = 1; var b = 2; a + b",
        "var newAdder = def(a,b){ var c = a+b; def(d){ c + d } }",
        "if (1 < 2) { 10 } el { 20 }",
        "var i = 0; while (i < 3) { i = i + 1 }; i",
        "suppress var x = def() { return y }",
        "[1, 2, 3][1] + {\"a\": 1}.a",
    ];
    for src in sources {
        parse_ok(src);
    }
}
