//! Built-in registry and the host surface intrinsics run against.
//!
//! The registry is an ordered vector: `GetBuiltin` operands are indices
//! into it, so the install order is part of the bytecode ABI. Ordinals past
//! the registry length address class namespaces, one per [`CLASS_NAMES`]
//! entry, in that order. Both the compiler and the VM read the same list.

use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::val::{HashData, Val};

/// Intrinsic signature. Failures are reported as `Val::Error` results, not
/// host errors.
pub type BuiltinFn = fn(&[Val], &mut Host) -> Val;

/// Classes addressable as `class.function`, in ordinal order.
pub const CLASS_NAMES: [&str; 11] = [
    "io", "type", "time", "os", "math", "string", "file", "pkg", "array", "sys", "keyboard",
];

#[derive(Clone, Copy)]
pub struct BuiltinDef {
    pub name: &'static str,
    /// Empty for top-level intrinsics callable by bare name; otherwise the
    /// intrinsic must be reached through its class namespace.
    pub class: &'static str,
    pub func: BuiltinFn,
}

impl BuiltinDef {
    pub const fn new(name: &'static str, class: &'static str, func: BuiltinFn) -> Self {
        BuiltinDef { name, class, func }
    }
}

impl fmt::Debug for BuiltinDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinDef")
            .field("name", &self.name)
            .field("class", &self.class)
            .finish()
    }
}

impl PartialEq for BuiltinDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.class == other.class && self.func as usize == other.func as usize
    }
}

/// The ordered intrinsic table plus class-namespace construction.
#[derive(Debug, Default)]
pub struct Registry {
    defs: Vec<BuiltinDef>,
}

impl Registry {
    pub fn new(defs: Vec<BuiltinDef>) -> Self {
        Registry { defs }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn defs(&self) -> &[BuiltinDef] {
        &self.defs
    }

    pub fn get(&self, index: usize) -> Option<&BuiltinDef> {
        self.defs.get(index)
    }

    pub fn by_name(&self, name: &str) -> Option<&BuiltinDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Builds the namespace hash for one class: every classed intrinsic of
    /// that class keyed by its name. A fresh hash per call, like the
    /// original's class-object factory.
    pub fn class_namespace(&self, class: &str) -> Val {
        let mut data = HashData::new();
        for def in &self.defs {
            if def.class == class {
                let key = Val::string(def.name);
                let digest = key.hash_key().expect("string keys always hash");
                data.insert(digest, (key, Val::Builtin(*def)));
            }
        }
        Val::hash(data)
    }

    /// Resolves a `GetBuiltin` ordinal past the intrinsic table to its
    /// class name.
    pub fn class_for_ordinal(&self, builtin_index: usize) -> Option<&'static str> {
        builtin_index
            .checked_sub(self.defs.len())
            .and_then(|i| CLASS_NAMES.get(i))
            .copied()
    }
}

/// Side-effect surface shared by the VM and the intrinsics: where output
/// goes, how large the next VM operand stack is, which package root the
/// `pkg` class operates on, and the handlers queued by event intrinsics for
/// the session to run.
pub struct Host {
    pub out: Box<dyn Write>,
    pub stack_capacity: usize,
    pub pkg_root: Option<PathBuf>,
    /// Closures queued by event intrinsics (`keyboard.listen`); drained and
    /// invoked by the session after each statement run.
    pub pending_handlers: Vec<Val>,
}

impl Host {
    pub fn new() -> Self {
        Host {
            out: Box::new(io::stdout()),
            stack_capacity: crate::vm::STACK_SIZE,
            pkg_root: None,
            pending_handlers: Vec::new(),
        }
    }

    pub fn with_writer(out: Box<dyn Write>) -> Self {
        Host {
            out,
            ..Host::new()
        }
    }

    /// The directory packages live under: the configured override or
    /// `~/.cache/sqdlang`.
    pub fn package_root(&self) -> PathBuf {
        self.pkg_root.clone().unwrap_or_else(|| {
            let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            home.join(".cache").join("sqdlang")
        })
    }
}

impl Default for Host {
    fn default() -> Self {
        Host::new()
    }
}
