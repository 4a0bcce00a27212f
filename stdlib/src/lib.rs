//! Built-in library for Squid.
//!
//! One module per builtin class. `install` returns the full intrinsic table
//! in registration order; that order is part of the bytecode ABI (GetBuiltin
//! ordinals), so new intrinsics go at the end of their class run and nothing
//! ever moves.

pub mod array;
pub mod file;
pub mod io;
pub mod keyboard;
pub mod math;
pub mod os;
pub mod pkg;
pub mod string;
pub mod sys;
pub mod time;
pub mod types;


use sqd_core::builtins::{BuiltinDef, Registry};
use sqd_core::val::Val;

/// The ordered intrinsic table. `cat` and `append` are top-level (empty
/// class) so they resolve by bare name; everything else is reached through
/// its class namespace.
pub fn install() -> Vec<BuiltinDef> {
    vec![
        BuiltinDef::new("tp", "type", types::tp),
        BuiltinDef::new("i2fl", "type", types::i2fl),
        BuiltinDef::new("fl2i", "type", types::fl2i),
        BuiltinDef::new("s2i", "type", types::s2i),
        BuiltinDef::new("s2fl", "type", types::s2fl),
        BuiltinDef::new("d2s", "type", types::d2s),
        BuiltinDef::new("append", "", array::append),
        BuiltinDef::new("read", "io", io::read),
        BuiltinDef::new("write", "io", io::write),
        BuiltinDef::new("echo", "io", io::echo),
        BuiltinDef::new("on", "keyboard", keyboard::on),
        BuiltinDef::new("read", "keyboard", keyboard::read),
        BuiltinDef::new("listen", "keyboard", keyboard::listen),
        BuiltinDef::new("stop", "keyboard", keyboard::stop),
        BuiltinDef::new("off", "keyboard", keyboard::off),
        BuiltinDef::new("env", "os", os::env),
        BuiltinDef::new("exec", "os", os::exec),
        BuiltinDef::new("exit", "os", os::exit),
        BuiltinDef::new("sleep", "time", time::sleep),
        BuiltinDef::new("now", "time", time::now),
        BuiltinDef::new("set_overflow_size", "sys", sys::set_overflow_size),
        BuiltinDef::new("get_overflow_size", "sys", sys::get_overflow_size),
        BuiltinDef::new("gc", "sys", sys::gc),
        BuiltinDef::new("rand", "math", math::rand),
        BuiltinDef::new("abs", "math", math::abs),
        BuiltinDef::new("sqrt", "math", math::sqrt),
        BuiltinDef::new("pow", "math", math::pow),
        BuiltinDef::new("sin", "math", math::sin),
        BuiltinDef::new("cos", "math", math::cos),
        BuiltinDef::new("pi", "math", math::pi),
        BuiltinDef::new("e", "math", math::e),
        BuiltinDef::new("include", "pkg", pkg::include),
        BuiltinDef::new("create", "pkg", pkg::create),
        BuiltinDef::new("list", "pkg", pkg::list),
        BuiltinDef::new("remove", "pkg", pkg::remove),
        BuiltinDef::new("upper", "string", string::upper),
        BuiltinDef::new("lower", "string", string::lower),
        BuiltinDef::new("trim", "string", string::trim),
        BuiltinDef::new("sepr", "string", string::sepr),
        BuiltinDef::new("read", "file", file::read),
        BuiltinDef::new("write", "file", file::write),
        BuiltinDef::new("pop", "array", array::pop),
        BuiltinDef::new("remove", "array", array::remove),
        BuiltinDef::new("cat", "", array::cat),
        BuiltinDef::new("join", "array", array::join),
    ]
}

pub fn registry() -> Registry {
    Registry::new(install())
}

/// Shared arity check producing the standard error value.
pub(crate) fn wrong_args(expected: &str, got: usize) -> Val {
    Val::error(format!(
        "Wrong number of arguments. Expected {}, got {}",
        expected, got
    ))
}
