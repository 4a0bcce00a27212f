//! Runtime values.
//!
//! Everything a Squid program can touch is a [`Val`]. Containers are
//! shared-mutable (`Rc<RefCell<..>>`): a captured array or hash mutated
//! through one holder is visible to every other holder, matching the source
//! language. Errors are ordinary values and flow on the operand stack; only
//! the `ErrorExit` opcode turns one into a terminating failure.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::builtins::BuiltinDef;


/// Bytecode plus the frame layout metadata the VM needs to call it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    pub instructions: Vec<u8>,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function bundled with the values it captured from enclosing
/// scopes. Captures are aliases, not copies of containers.
#[derive(Debug, Clone)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Val>,
}

/// A first-class error: message plus the source position it originated at.
/// `line == 0` means the error carries no position (builtin failures).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorVal {
    pub message: String,
    pub line: u32,
    pub column: u32,
    pub file: String,
}

impl ErrorVal {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorVal {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn at(message: impl Into<String>, line: u32, column: u32) -> Self {
        ErrorVal {
            message: message.into(),
            line,
            column,
            file: String::new(),
        }
    }
}

impl fmt::Display for ErrorVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            return write!(f, "ERROR: {}", self.message);
        }
        if self.file.is_empty() {
            write!(f, "ERROR: {}:{}: {}", self.line, self.column, self.message)
        } else {
            write!(
                f,
                "ERROR: {}:{}:{}: {}",
                self.file, self.line, self.column, self.message
            )
        }
    }
}

/// `pkg.include(path, ns)` evaluates to one of these; the host expands it
/// by running the file and binding a namespace hash.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeDirective {
    pub filename: String,
    pub namespace: String,
}

/// Hash keys for the hashable value kinds. String keys store an FNV-1a
/// digest of the text, the original's scheme; the full key value is kept in
/// the pair so display survives hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashKey {
    Int(i64),
    Bool(bool),
    Str(u64),
}

fn fnv1a(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

/// Hash storage: key digest to (key, value) pair, ordered for deterministic
/// display and serialization.
pub type HashData = BTreeMap<HashKey, (Val, Val)>;

#[derive(Debug, Clone)]
pub enum Val {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    Array(Rc<RefCell<Vec<Val>>>),
    Hash(Rc<RefCell<HashData>>),
    Function(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    Builtin(BuiltinDef),
    Error(Rc<ErrorVal>),
    Include(Rc<IncludeDirective>),
}

impl Val {
    pub fn string(s: impl Into<String>) -> Val {
        Val::Str(Rc::from(s.into().into_boxed_str()))
    }

    pub fn array(elements: Vec<Val>) -> Val {
        Val::Array(Rc::new(RefCell::new(elements)))
    }

    pub fn hash(data: HashData) -> Val {
        Val::Hash(Rc::new(RefCell::new(data)))
    }

    pub fn error(message: impl Into<String>) -> Val {
        Val::Error(Rc::new(ErrorVal::new(message)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Int(_) => "INTEGER",
            Val::Float(_) => "FLOAT",
            Val::Bool(_) => "BOOLEAN",
            Val::Str(_) => "STRING",
            Val::Null => "NULL",
            Val::Array(_) => "ARRAY",
            Val::Hash(_) => "HASH",
            Val::Function(_) => "COMPILED_FUNCTION",
            Val::Closure(_) => "CLOSURE",
            Val::Builtin(_) => "BUILTIN",
            Val::Error(_) => "ERROR",
            Val::Include(_) => "INCLUDE",
        }
    }

    /// Only `false` and `null` are falsey.
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Null => false,
            _ => true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Val::Error(_))
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Val::Int(v) => Some(HashKey::Int(*v)),
            Val::Bool(v) => Some(HashKey::Bool(*v)),
            Val::Str(s) => Some(HashKey::Str(fnv1a(s))),
            _ => None,
        }
    }

    /// Identity-flavored equality used by the VM's `==` fallback: value
    /// semantics for the singleton-like kinds, pointer identity for shared
    /// containers and functions, never true across kinds.
    pub fn ident_eq(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Null, Val::Null) => true,
            (Val::Array(a), Val::Array(b)) => Rc::ptr_eq(a, b),
            (Val::Hash(a), Val::Hash(b)) => Rc::ptr_eq(a, b),
            (Val::Function(a), Val::Function(b)) => Rc::ptr_eq(a, b),
            (Val::Closure(a), Val::Closure(b)) => Rc::ptr_eq(a, b),
            (Val::Error(a), Val::Error(b)) => Rc::ptr_eq(a, b),
            (Val::Builtin(a), Val::Builtin(b)) => a == b,
            _ => false,
        }
    }

    /// Display form per kind: raw string contents, canonical decimals,
    /// `[..]` arrays, `{k: v}` hashes, `ERROR: ...` for error values.
    pub fn inspect(&self) -> String {
        match self {
            Val::Int(v) => v.to_string(),
            Val::Float(v) => v.to_string(),
            Val::Bool(v) => v.to_string(),
            Val::Str(s) => s.to_string(),
            Val::Null => "null".to_string(),
            Val::Array(elements) => {
                let parts: Vec<String> = elements.borrow().iter().map(|e| e.inspect()).collect();
                format!("[{}]", parts.join(", "))
            }
            Val::Hash(data) => {
                let parts: Vec<String> = data
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Val::Function(func) => format!("CompiledFunction[{:p}]", Rc::as_ptr(func)),
            Val::Closure(cl) => format!("Closure[{:p}]", Rc::as_ptr(cl)),
            Val::Builtin(def) => format!("builtin function {}", def.name),
            Val::Error(err) => err.to_string(),
            Val::Include(directive) => format!("include {}", directive.filename),
        }
    }
}

/// Content comparison for tests and constant-pool round-trips. The VM's own
/// `==` goes through the typed comparison paths plus [`Val::ident_eq`].
impl PartialEq for Val {
    fn eq(&self, other: &Val) -> bool {
        match (self, other) {
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a == b,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::Null, Val::Null) => true,
            (Val::Array(a), Val::Array(b)) => *a.borrow() == *b.borrow(),
            (Val::Hash(a), Val::Hash(b)) => *a.borrow() == *b.borrow(),
            (Val::Function(a), Val::Function(b)) => a == b,
            (Val::Closure(a), Val::Closure(b)) => Rc::ptr_eq(a, b),
            (Val::Builtin(a), Val::Builtin(b)) => a == b,
            (Val::Error(a), Val::Error(b)) => a == b,
            (Val::Include(a), Val::Include(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}
