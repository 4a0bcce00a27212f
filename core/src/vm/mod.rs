//! Bytecode subsystem: opcodes, symbol tables, the single-pass compiler,
//! the stack VM, and the binary package format.

pub mod code;
mod compiler;
mod frame;
mod sqdb;
pub mod symbols;
#[allow(clippy::module_inception)]
mod vm;

pub use compiler::{Bytecode, Compiler};
pub use frame::Frame;
pub use sqdb::{Package, VERSION};
pub use vm::{GLOBALS_SIZE, MAX_FRAMES, STACK_SIZE, Vm};

#[cfg(test)]
mod vm_test;
