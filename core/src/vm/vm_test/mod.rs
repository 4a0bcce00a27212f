//! VM behavior tests, grouped by topic. The helper compiles and runs one
//! program on a fresh machine, seeding deferred undefined-global
//! diagnostics the way the host runners do.

use std::rc::Rc;

use crate::ast::Parser;
use crate::builtins::{Host, Registry};
use crate::val::Val;
use crate::vm::{Compiler, GLOBALS_SIZE, Vm};

mod control_flow;
mod errors;
mod functions;
mod semantics;

fn run(input: &str) -> anyhow::Result<Option<Val>> {
    let mut parser = Parser::from_source(input);
    let program = parser.parse_program();
    assert!(parser.errors().is_empty(), "parser errors: {:?}", parser.errors());

    let registry = Rc::new(Registry::default());
    let mut compiler = Compiler::new(Rc::clone(&registry));
    compiler.compile(&program)?;

    let mut globals = vec![Val::Null; GLOBALS_SIZE];
    for (idx, err) in compiler.undefined_globals() {
        globals[*idx] = Val::Error(Rc::new(err.clone()));
    }

    let mut vm = Vm::with_globals_store(compiler.bytecode(), registry, globals);
    let mut host = Host::with_writer(Box::new(std::io::sink()));
    vm.run(&mut host)?;
    Ok(vm.last_popped())
}

fn run_val(input: &str) -> Val {
    run(input)
        .expect("vm error")
        .unwrap_or_else(|| panic!("display-suppressed result for {:?}", input))
}

fn run_err(input: &str) -> String {
    run(input).expect_err("expected vm error").to_string()
}

fn assert_cases(cases: &[(&str, Val)]) {
    for (input, expected) in cases {
        assert_eq!(&run_val(input), expected, "input: {}", input);
    }
}
