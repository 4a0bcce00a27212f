//! The stack virtual machine.
//!
//! Error values flow on the stack like any other value; the machine itself
//! only fails on invariant violations (overflow, wrong arity, unsupported
//! operand types) or when `ErrorExit` consumes an Error at the top of the
//! stack.

use std::rc::Rc;

use anyhow::{Result, bail};
use tracing::trace;

use crate::builtins::{Host, Registry};
use crate::val::{Closure, CompiledFunction, HashData, Val};
use crate::vm::code::{Op, read_u8, read_u16};
use crate::vm::compiler::Bytecode;
use crate::vm::frame::Frame;

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65536;
pub const MAX_FRAMES: usize = 1024;

pub struct Vm {
    constants: Vec<Val>,
    stack: Vec<Val>,
    sp: usize,
    globals: Vec<Val>,
    frames: Vec<Frame>,
    last_op: Op,
    registry: Rc<Registry>,
}

impl Vm {
    pub fn new(bytecode: Bytecode, registry: Rc<Registry>) -> Self {
        Vm::with_config(bytecode, registry, vec![Val::Null; GLOBALS_SIZE], STACK_SIZE)
    }

    /// Runs against an existing globals array so sessions keep bindings
    /// across statements.
    pub fn with_globals_store(bytecode: Bytecode, registry: Rc<Registry>, globals: Vec<Val>) -> Self {
        Vm::with_config(bytecode, registry, globals, STACK_SIZE)
    }

    pub fn with_config(bytecode: Bytecode, registry: Rc<Registry>, globals: Vec<Val>, stack_capacity: usize) -> Self {
        let main_fn = CompiledFunction {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
        };
        let main_closure = Rc::new(Closure {
            func: Rc::new(main_fn),
            free: Vec::new(),
        });

        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(Frame::new(main_closure, 0));

        Vm {
            constants: bytecode.constants,
            stack: vec![Val::Null; stack_capacity],
            sp: 0,
            globals,
            frames,
            last_op: Op::Constant,
            registry,
        }
    }

    /// Returns the globals array to the session after a run.
    pub fn into_globals(self) -> Vec<Val> {
        self.globals
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    pub fn run(&mut self, host: &mut Host) -> Result<()> {
        trace!(constants = self.constants.len(), "vm run");
        loop {
            let next_ip = (self.current_frame().ip + 1) as usize;
            if next_ip >= self.current_frame().closure.func.instructions.len() {
                break;
            }
            self.current_frame_mut().ip = next_ip as i64;
            let func = Rc::clone(&self.current_frame().closure.func);
            let ins = &func.instructions;
            let ip = next_ip;

            let Some(op) = Op::from_u8(ins[ip]) else {
                bail!("Unknown opcode: {}", ins[ip]);
            };
            self.last_op = op;

            match op {
                Op::Constant => {
                    let idx = read_u16(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 2;
                    let value = self.constants[idx].clone();
                    self.push(value)?;
                }

                Op::Add | Op::Sub | Op::Mul | Op::Div | Op::Mod => {
                    self.execute_binary_operation(op)?;
                }

                Op::And | Op::Or => {
                    let right = self.pop();
                    let left = self.pop();
                    let result = match op {
                        Op::And => left.is_truthy() && right.is_truthy(),
                        _ => left.is_truthy() || right.is_truthy(),
                    };
                    self.push(Val::Bool(result))?;
                }

                Op::Equal | Op::NotEqual | Op::GreaterThan => {
                    self.execute_comparison(op)?;
                }

                Op::True => self.push(Val::Bool(true))?,
                Op::False => self.push(Val::Bool(false))?,
                Op::Null => self.push(Val::Null)?,

                Op::Bang => {
                    let operand = self.pop();
                    self.push(Val::Bool(!operand.is_truthy()))?;
                }

                Op::Negate => {
                    let operand = self.pop();
                    match operand {
                        Val::Int(v) => self.push(Val::Int(-v))?,
                        Val::Float(v) => self.push(Val::Float(-v))?,
                        other => bail!("Unsupported type for negation: {}", other.type_name()),
                    }
                }

                Op::Array => {
                    let n = read_u16(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 2;
                    let elements = self.stack[self.sp - n..self.sp].to_vec();
                    self.sp -= n;
                    self.push(Val::array(elements))?;
                }

                Op::Hash => {
                    let n = read_u16(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 2;
                    let hash = self.build_hash(self.sp - n, self.sp)?;
                    self.sp -= n;
                    self.push(hash)?;
                }

                Op::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    self.execute_index_expression(left, index)?;
                }

                Op::Dot => {
                    let right = self.pop();
                    let left = self.pop();
                    self.execute_dot_expression(left, right)?;
                }

                Op::Jump => {
                    let pos = read_u16(&ins[ip + 1..]) as i64;
                    self.current_frame_mut().ip = pos - 1;
                }

                Op::JumpNotTruthy => {
                    let pos = read_u16(&ins[ip + 1..]) as i64;
                    self.current_frame_mut().ip += 2;
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.current_frame_mut().ip = pos - 1;
                    }
                }

                Op::SetGlobal => {
                    let idx = read_u16(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 2;
                    self.globals[idx] = self.pop();
                }

                Op::GetGlobal => {
                    let idx = read_u16(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 2;
                    let value = self.globals[idx].clone();
                    self.push(value)?;
                }

                Op::SetLocal => {
                    let idx = read_u8(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 1;
                    let base = self.current_frame().base_pointer;
                    self.stack[base + idx] = self.pop();
                }

                Op::GetLocal => {
                    let idx = read_u8(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 1;
                    let base = self.current_frame().base_pointer;
                    let value = self.stack[base + idx].clone();
                    self.push(value)?;
                }

                Op::GetFree => {
                    let idx = read_u8(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 1;
                    let value = self.current_frame().closure.free[idx].clone();
                    self.push(value)?;
                }

                Op::GetBuiltin => {
                    let idx = read_u8(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 1;
                    if let Some(def) = self.registry.get(idx).copied() {
                        self.push(Val::Builtin(def))?;
                    } else if let Some(class) = self.registry.class_for_ordinal(idx) {
                        let namespace = self.registry.class_namespace(class);
                        self.push(namespace)?;
                    } else {
                        bail!("Builtin index out of range: {}", idx);
                    }
                }

                Op::Call => {
                    let argc = read_u8(&ins[ip + 1..]) as usize;
                    self.current_frame_mut().ip += 1;
                    self.execute_call(argc, host)?;
                }

                Op::Closure => {
                    let const_idx = read_u16(&ins[ip + 1..]) as usize;
                    let num_free = read_u8(&ins[ip + 3..]) as usize;
                    self.current_frame_mut().ip += 3;
                    self.push_closure(const_idx, num_free)?;
                }

                Op::CurrentClosure => {
                    let closure = Rc::clone(&self.current_frame().closure);
                    self.push(Val::Closure(closure))?;
                }

                Op::ReturnValue => {
                    if self.frames.len() <= 1 {
                        bail!("Return outside of a function");
                    }
                    let return_value = self.pop();
                    let frame = self.frames.pop().expect("return without frame");
                    self.sp = frame.base_pointer - 1;
                    self.push(return_value)?;
                }

                Op::Return => {
                    if self.frames.len() <= 1 {
                        bail!("Return outside of a function");
                    }
                    let frame = self.frames.pop().expect("return without frame");
                    self.sp = frame.base_pointer - 1;
                    self.push(Val::Null)?;
                }

                Op::Pop | Op::Suppress => {
                    if self.sp > 0 {
                        self.pop();
                    }
                }

                Op::IsError => {
                    let is_error = self.sp > 0 && self.stack[self.sp - 1].is_error();
                    self.push(Val::Bool(is_error))?;
                }

                Op::ErrorExit => {
                    let err = self.pop();
                    bail!("{}", err.inspect());
                }
            }
        }

        Ok(())
    }

    /// Invokes one registered event handler by pushing the closure and its
    /// arguments and running the dispatch loop until the handler returns.
    /// Nested runs serialize on the calling thread.
    pub fn trigger_handler(&mut self, closure: Rc<Closure>, args: &[Val], host: &mut Host) -> Result<()> {
        if args.len() != closure.func.num_parameters {
            bail!(
                "handler parameter mismatch: expected {}, got {}",
                closure.func.num_parameters,
                args.len()
            );
        }

        self.push(Val::Closure(Rc::clone(&closure)))?;
        for arg in args {
            self.push(arg.clone())?;
        }
        self.call_closure(closure, args.len())?;
        self.run(host)?;

        // Discard the handler's return value.
        if self.sp > 0 {
            self.pop();
        }
        Ok(())
    }

    /// The value most recently popped, unless the final opcode marks the
    /// statement as display-suppressed (pure assignment or `suppress`).
    pub fn last_popped(&self) -> Option<Val> {
        if matches!(self.last_op, Op::SetGlobal | Op::SetLocal | Op::Suppress) {
            return None;
        }
        self.stack.get(self.sp).cloned()
    }

    fn push(&mut self, value: Val) -> Result<()> {
        if self.sp >= self.stack.len() {
            bail!("STACK OVERFLOW");
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Val {
        self.sp -= 1;
        self.stack[self.sp].clone()
    }

    fn execute_binary_operation(&mut self, op: Op) -> Result<()> {
        let right = self.pop();
        let left = self.pop();

        match (&left, &right) {
            (Val::Int(l), Val::Int(r)) => self.execute_integer_operation(op, *l, *r),
            (Val::Float(l), Val::Float(r)) => self.execute_float_operation(op, *l, *r),
            (Val::Int(l), Val::Float(r)) => self.execute_float_operation(op, *l as f64, *r),
            (Val::Float(l), Val::Int(r)) => self.execute_float_operation(op, *l, *r as f64),
            (Val::Str(l), Val::Str(r)) => {
                if op != Op::Add {
                    bail!("Unknown string operator: {}", op.name());
                }
                let joined = format!("{}{}", l, r);
                self.push(Val::string(joined))
            }
            _ => bail!(
                "Unsupported types for binary operation: {} {}",
                left.type_name(),
                right.type_name()
            ),
        }
    }

    fn execute_integer_operation(&mut self, op: Op, left: i64, right: i64) -> Result<()> {
        let result = match op {
            Op::Add => left.wrapping_add(right),
            Op::Sub => left.wrapping_sub(right),
            Op::Mul => left.wrapping_mul(right),
            Op::Div => {
                if right == 0 {
                    bail!("Division by zero");
                }
                left.wrapping_div(right)
            }
            Op::Mod => {
                if right == 0 {
                    bail!("Modulo by zero");
                }
                left.wrapping_rem(right)
            }
            _ => bail!("Unknown integer operator: {}", op.name()),
        };
        self.push(Val::Int(result))
    }

    fn execute_float_operation(&mut self, op: Op, left: f64, right: f64) -> Result<()> {
        let result = match op {
            Op::Add => left + right,
            Op::Sub => left - right,
            Op::Mul => left * right,
            Op::Div => {
                if right == 0.0 {
                    bail!("Division by zero");
                }
                left / right
            }
            Op::Mod => {
                if right == 0.0 {
                    bail!("Modulo by zero");
                }
                left % right
            }
            _ => bail!("Unknown float operation: {}", op.name()),
        };
        self.push(Val::Float(result))
    }

    fn execute_comparison(&mut self, op: Op) -> Result<()> {
        let right = self.pop();
        let left = self.pop();

        if let (Val::Int(l), Val::Int(r)) = (&left, &right) {
            let result = match op {
                Op::Equal => l == r,
                Op::NotEqual => l != r,
                Op::GreaterThan => l > r,
                _ => bail!("Unknown operator: {}", op.name()),
            };
            return self.push(Val::Bool(result));
        }

        if let (Val::Str(l), Val::Str(r)) = (&left, &right) {
            let result = match op {
                Op::Equal => l == r,
                Op::NotEqual => l != r,
                Op::GreaterThan => l > r,
                _ => bail!("Unknown operator: {}", op.name()),
            };
            return self.push(Val::Bool(result));
        }

        match op {
            Op::Equal => {
                let eq = left.ident_eq(&right);
                self.push(Val::Bool(eq))
            }
            Op::NotEqual => {
                let eq = left.ident_eq(&right);
                self.push(Val::Bool(!eq))
            }
            _ => bail!(
                "Unknown operator: {} ({} {})",
                op.name(),
                left.type_name(),
                right.type_name()
            ),
        }
    }

    fn build_hash(&mut self, start: usize, end: usize) -> Result<Val> {
        let mut data = HashData::new();
        let mut i = start;
        while i < end {
            let key = self.stack[i].clone();
            let value = self.stack[i + 1].clone();
            let Some(digest) = key.hash_key() else {
                bail!("unusable as hash key: {}", key.type_name());
            };
            data.insert(digest, (key, value));
            i += 2;
        }
        Ok(Val::hash(data))
    }

    fn execute_index_expression(&mut self, left: Val, index: Val) -> Result<()> {
        match (&left, &index) {
            (Val::Array(elements), Val::Int(i)) => {
                // Out-of-range indexing quietly yields null.
                let elements = elements.borrow();
                let value = if *i < 0 || *i as usize >= elements.len() {
                    Val::Null
                } else {
                    elements[*i as usize].clone()
                };
                drop(elements);
                self.push(value)
            }
            (Val::Hash(data), _) => {
                let Some(digest) = index.hash_key() else {
                    bail!("Unusable as hash key: {}", index.type_name());
                };
                let value = data.borrow().get(&digest).map(|(_, v)| v.clone()).unwrap_or(Val::Null);
                self.push(value)
            }
            _ => bail!("Index operator not supported: {}", left.type_name()),
        }
    }

    fn execute_dot_expression(&mut self, left: Val, right: Val) -> Result<()> {
        let Val::Hash(data) = &left else {
            bail!("Dot operator not supported: {}", left.type_name());
        };
        if !matches!(right, Val::Str(_)) {
            bail!("Dot operator requires string identifier, got: {}", right.type_name());
        }
        let digest = right.hash_key().expect("string keys always hash");
        let value = data.borrow().get(&digest).map(|(_, v)| v.clone()).unwrap_or(Val::Null);
        self.push(value)
    }

    fn execute_call(&mut self, argc: usize, host: &mut Host) -> Result<()> {
        let callee = self.stack[self.sp - 1 - argc].clone();
        match callee {
            Val::Closure(closure) => self.call_closure(closure, argc),
            Val::Builtin(def) => self.call_builtin(def.func, argc, host),
            _ => bail!("Calling non-function and non-builtin function."),
        }
    }

    fn call_closure(&mut self, closure: Rc<Closure>, argc: usize) -> Result<()> {
        if argc != closure.func.num_parameters {
            bail!(
                "Wrong number of arguments. Expected {}, got {}",
                closure.func.num_parameters,
                argc
            );
        }
        if self.frames.len() >= MAX_FRAMES {
            bail!("STACK OVERFLOW");
        }

        let base_pointer = self.sp - argc;
        let num_locals = closure.func.num_locals;
        if base_pointer + num_locals > self.stack.len() {
            bail!("STACK OVERFLOW");
        }
        self.frames.push(Frame::new(closure, base_pointer));
        self.sp = base_pointer + num_locals;
        Ok(())
    }

    fn call_builtin(&mut self, func: crate::builtins::BuiltinFn, argc: usize, host: &mut Host) -> Result<()> {
        let args = self.stack[self.sp - argc..self.sp].to_vec();
        let result = func(&args, host);
        self.sp = self.sp - argc - 1;
        self.push(result)
    }

    fn push_closure(&mut self, const_idx: usize, num_free: usize) -> Result<()> {
        let constant = self.constants[const_idx].clone();
        let Val::Function(func) = constant else {
            bail!("{} is not a function.", constant.inspect());
        };
        let free = self.stack[self.sp - num_free..self.sp].to_vec();
        self.sp -= num_free;
        self.push(Val::Closure(Rc::new(Closure { func, free })))
    }
}
