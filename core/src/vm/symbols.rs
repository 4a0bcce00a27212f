//! Nested symbol tables for name resolution.
//!
//! Resolving a name that lives in an enclosing non-global scope promotes it
//! to a Free symbol here and records the original in `free_symbols`; the
//! compiler emits one capture load per recorded symbol when the scope
//! closes into a closure.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
    Builtin,
    Free,
    /// Recursive self-reference bound by `var name = def(...)`.
    Function,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: Scope,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    pub outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    pub num_definitions: usize,
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..SymbolTable::default()
        }
    }

    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() { Scope::Global } else { Scope::Local };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    /// Places a builtin at a pre-agreed ordinal; the index is part of the
    /// bytecode ABI.
    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: Scope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: Scope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name.clone(),
            scope: Scope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }
        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        if symbol.scope == Scope::Global || symbol.scope == Scope::Builtin {
            return Some(symbol);
        }
        Some(self.define_free(symbol))
    }

    /// Defines a name in the outermost (global) table; used for deferred
    /// resolution of identifiers referenced inside functions before they
    /// exist.
    pub fn define_in_outermost(&mut self, name: &str) -> Symbol {
        match self.outer.as_mut() {
            Some(outer) => outer.define_in_outermost(name),
            None => self.define(name),
        }
    }

    /// All symbols defined directly in this table (no outer walk).
    pub fn iter_local(&self) -> impl Iterator<Item = &Symbol> {
        self.store.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_resolve_globals() {
        let mut global = SymbolTable::new();
        let a = global.define("a");
        assert_eq!(a.scope, Scope::Global);
        assert_eq!(a.index, 0);
        let b = global.define("b");
        assert_eq!(b.index, 1);

        assert_eq!(global.resolve("a"), Some(a));
        assert_eq!(global.resolve("b"), Some(b));
        assert_eq!(global.resolve("c"), None);
    }

    #[test]
    fn test_locals_shadow_and_nest() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut local = SymbolTable::new_enclosed(global);
        let b = local.define("b");
        assert_eq!(b.scope, Scope::Local);
        assert_eq!(b.index, 0);

        let a = local.resolve("a").unwrap();
        assert_eq!(a.scope, Scope::Global);
    }

    #[test]
    fn test_resolve_free_promotes_once() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut outer = SymbolTable::new_enclosed(global);
        outer.define("c");
        let mut inner = SymbolTable::new_enclosed(outer);
        inner.define("e");

        // Repeated resolution of the same outer local must record exactly
        // one free symbol.
        let first = inner.resolve("c").unwrap();
        let second = inner.resolve("c").unwrap();
        assert_eq!(first.scope, Scope::Free);
        assert_eq!(first, second);
        assert_eq!(inner.free_symbols.len(), 1);

        // Globals never become free.
        let a = inner.resolve("a").unwrap();
        assert_eq!(a.scope, Scope::Global);
        assert_eq!(inner.free_symbols.len(), 1);
    }

    #[test]
    fn test_builtin_and_function_scopes() {
        let mut global = SymbolTable::new();
        global.define_builtin(7, "echo");
        let echo = global.resolve("echo").unwrap();
        assert_eq!(echo.scope, Scope::Builtin);
        assert_eq!(echo.index, 7);

        let mut fn_scope = SymbolTable::new_enclosed(global);
        fn_scope.define_function_name("fact");
        let fact = fn_scope.resolve("fact").unwrap();
        assert_eq!(fact.scope, Scope::Function);
    }

    #[test]
    fn test_define_in_outermost_from_inner_scope() {
        let global = SymbolTable::new();
        let outer = SymbolTable::new_enclosed(global);
        let mut inner = SymbolTable::new_enclosed(outer);

        let sym = inner.define_in_outermost("lazy");
        assert_eq!(sym.scope, Scope::Global);
        assert_eq!(sym.index, 0);
    }
}
