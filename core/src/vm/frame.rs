//! Call frames.

use std::rc::Rc;

use crate::val::Closure;

/// One in-progress call: the closure being executed, its instruction
/// pointer, and where its locals start on the operand stack. `ip` begins at
/// -1; the dispatch loop pre-increments.
#[derive(Debug)]
pub struct Frame {
    pub closure: Rc<Closure>,
    pub ip: i64,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Frame {
            closure,
            ip: -1,
            base_pointer,
        }
    }
}
