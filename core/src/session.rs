//! Per-session execution state.
//!
//! A session owns everything that survives from one statement to the next:
//! the symbol table, the constant pool, the globals array, the host surface,
//! and the ledger of deferred undefined-global diagnostics. REPL, file
//! executor and include machinery all drive the same `execute` path. There
//! is no process-wide state; dropping the session tears everything down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use crate::ast::{Parser, Program, Stmt};
use crate::builtins::{CLASS_NAMES, Host, Registry};
use crate::include::Loader;
use crate::val::{ErrorVal, HashData, IncludeDirective, Val};
use crate::vm::{Compiler, GLOBALS_SIZE, Vm};
use crate::vm::symbols::{Scope, SymbolTable};

pub struct Session {
    registry: Rc<Registry>,
    symbol_table: Option<SymbolTable>,
    constants: Vec<Val>,
    globals: Vec<Val>,
    pub host: Host,
    file_name: Option<String>,
    /// Deferred diagnostics: global slot -> positioned error, seeded into
    /// the globals array before each run so reads of never-defined names
    /// yield a descriptive Error value.
    pending_undefined: HashMap<usize, ErrorVal>,
    loader: Loader,
}

impl Session {
    pub fn new(registry: Rc<Registry>, host: Host) -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, def) in registry.defs().iter().enumerate() {
            symbol_table.define_builtin(i, def.name);
        }

        // Class namespaces live in globals here (the standalone path
        // resolves them through builtin ordinals instead; both spellings
        // reach the same hashes).
        let mut globals = vec![Val::Null; GLOBALS_SIZE];
        for class in CLASS_NAMES {
            let symbol = symbol_table.define(class);
            globals[symbol.index] = registry.class_namespace(class);
        }

        let loader = Loader::new(host.package_root());
        Session {
            registry,
            symbol_table: Some(symbol_table),
            constants: Vec::new(),
            globals,
            host,
            file_name: None,
            pending_undefined: HashMap::new(),
            loader,
        }
    }

    pub fn registry(&self) -> Rc<Registry> {
        Rc::clone(&self.registry)
    }

    /// File name attached to deferred-diagnostic errors.
    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = Some(name.into());
    }

    pub fn take_host(&mut self) -> Host {
        std::mem::replace(&mut self.host, Host::new())
    }

    /// Looks up a top-level binding by name; test and tooling helper.
    pub fn lookup_global(&self, name: &str) -> Option<Val> {
        let table = self.symbol_table.as_ref()?;
        table
            .iter_local()
            .find(|s| s.scope == Scope::Global && s.name == name)
            .map(|s| self.globals[s.index].clone())
    }

    /// Parses and runs one unit of source against the session state.
    /// Returns the displayable result: `None` when the last opcode
    /// suppresses display, otherwise the last-popped value.
    pub fn execute(&mut self, source: &str) -> Result<Option<Val>> {
        let mut parser = Parser::from_source(source);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            let mut msg = String::from("ERROR:\n");
            for err in parser.errors() {
                msg.push('\t');
                msg.push_str(err);
                msg.push('\n');
            }
            bail!("{}", msg.trim_end().to_string());
        }
        self.execute_program(&program)
    }

    pub fn execute_program(&mut self, program: &Program) -> Result<Option<Val>> {
        let table = self.symbol_table.take().expect("session table present");
        let constants = std::mem::take(&mut self.constants);
        let mut compiler = Compiler::new_with_state(self.registry(), table, constants);

        let compiled = compiler.compile(program);
        let new_undefined = compiler.undefined_globals().clone();
        let bytecode = compiler.bytecode();
        let (mut table, constants) = compiler.into_state();
        // A compile error inside a function body leaves the table nested;
        // unwind so the session keeps resolving at the global scope.
        while let Some(outer) = table.outer.take() {
            table = *outer;
        }
        self.symbol_table = Some(table);
        self.constants = constants;
        compiled?;

        // Seed earlier deferred diagnostics unconditionally; this
        // statement's own entries are withheld when a suppress-wrapped let
        // introduced them on its own line, so the error surfaces only when
        // the binding is later read.
        for (idx, err) in &self.pending_undefined {
            self.globals[*idx] = Val::Error(Rc::new(err.clone()));
        }
        let suppressed_let_line = match program.statements.first() {
            Some(Stmt::Suppress { inner, .. }) => match inner.as_ref() {
                Stmt::Let { token, .. } => Some(token.line),
                _ => None,
            },
            _ => None,
        };
        for (idx, err) in &new_undefined {
            let mut err = err.clone();
            if err.file.is_empty() {
                if let Some(file) = &self.file_name {
                    err.file = file.clone();
                }
            }
            if suppressed_let_line != Some(err.line) {
                self.globals[*idx] = Val::Error(Rc::new(err.clone()));
            }
            self.pending_undefined.insert(*idx, err);
        }

        debug!(
            instructions = bytecode.instructions.len(),
            constants = self.constants.len(),
            "executing statement"
        );

        let globals = std::mem::take(&mut self.globals);
        let mut vm = Vm::with_config(bytecode, self.registry(), globals, self.host.stack_capacity);

        let run_result = vm.run(&mut self.host);

        // Event intrinsics may have queued handlers; run them to completion
        // on this thread before the statement is considered done.
        let mut handler_result = Ok(());
        if run_result.is_ok() {
            let pending = std::mem::take(&mut self.host.pending_handlers);
            for handler in pending {
                if let Val::Closure(closure) = handler {
                    handler_result = vm.trigger_handler(closure, &[], &mut self.host);
                    if handler_result.is_err() {
                        break;
                    }
                }
            }
        }

        let last = vm.last_popped();
        self.globals = vm.into_globals();
        run_result?;
        handler_result?;

        if let Some(Val::Include(directive)) = &last {
            let directive = directive.clone();
            self.expand_include(&directive)?;
            return Ok(None);
        }

        Ok(last)
    }

    /// Runs a whole file through this session statement by statement,
    /// discarding per-statement results. Nested `include(...)` lines go
    /// back through the loader.
    pub fn source_file(&mut self, path: &Path) -> Result<()> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
        for statement in crate::include::split_statements(&content) {
            match crate::include::try_parse_include(&statement) {
                Some(spec) => self.include(&spec)?,
                None => {
                    self.execute(&statement)?;
                }
            }
        }
        Ok(())
    }

    /// The textual `include("name")` form: resolve through the loader's
    /// search paths and source the file into this session. Files already
    /// loaded are skipped, so circular includes terminate.
    pub fn include(&mut self, spec: &str) -> Result<()> {
        match self.loader.begin_load(spec)? {
            Some(path) => self.source_file(&path),
            None => Ok(()),
        }
    }

    /// `pkg.include(path, ns)`: runs the file in a fresh session and binds
    /// a hash of its top-level callable bindings under the namespace name.
    fn expand_include(&mut self, directive: &IncludeDirective) -> Result<()> {
        let chosen = self
            .resolve_include_path(&directive.filename)
            .ok_or_else(|| anyhow!("Failed to read include file '{}': file not found", directive.filename))?;
        let content = std::fs::read_to_string(&chosen)
            .with_context(|| format!("Failed to read include file '{}'", chosen.display()))?;

        let host = self.take_host();
        let mut sub = Session::new(self.registry(), host);
        sub.set_file_name(chosen.to_string_lossy().into_owned());
        let result = sub.execute(&content);
        self.host = sub.take_host();
        result.with_context(|| format!("Evaluation error in '{}'", directive.filename))?;

        let mut data = HashData::new();
        if let Some(table) = sub.symbol_table.as_ref() {
            for symbol in table.iter_local() {
                if symbol.scope != Scope::Global {
                    continue;
                }
                let value = sub.globals[symbol.index].clone();
                if matches!(value, Val::Closure(_) | Val::Builtin(_) | Val::Function(_)) {
                    let key = Val::string(symbol.name.clone());
                    let digest = key.hash_key().expect("string keys always hash");
                    data.insert(digest, (key, value));
                }
            }
        }

        let table = self.symbol_table.as_mut().expect("session table present");
        let symbol = table.define(&directive.namespace);
        self.globals[symbol.index] = Val::hash(data);
        Ok(())
    }

    fn resolve_include_path(&self, filename: &str) -> Option<PathBuf> {
        let normalized = PathBuf::from(filename.replace('\\', "/"));
        let mut candidates = vec![normalized.clone()];
        if let Some(file) = &self.file_name {
            if let Some(dir) = Path::new(file).parent() {
                candidates.push(dir.join(&normalized));
                candidates.push(dir.join("lib").join(&normalized));
            }
        }
        candidates.push(Path::new("lib").join(&normalized));

        candidates.into_iter().find(|c| c.is_file())
    }
}
