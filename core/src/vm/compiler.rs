//! Single-pass compiler from AST to bytecode.
//!
//! One compilation scope per function body; a loop-context stack collects
//! pending break/continue jumps for back-patching. Compiler state (symbol
//! table, constant pool) can be handed from statement to statement so a
//! session sees earlier definitions.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, bail};
use tracing::trace;

use crate::ast::{BlockStmt, Expr, Ident, Program, Stmt};
use crate::builtins::{CLASS_NAMES, Registry};
use crate::val::{CompiledFunction, ErrorVal, Val};
use crate::vm::code::{Instructions, Op, make, read_u16};
use crate::vm::symbols::{Scope, Symbol, SymbolTable};

/// Placeholder operand for jumps whose target is not yet known.
const PATCH_PLACEHOLDER: usize = 9999;

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: Op,
    position: usize,
}

#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last_instruction: Option<EmittedInstruction>,
    previous_instruction: Option<EmittedInstruction>,
}

#[derive(Debug)]
struct LoopContext {
    loop_start: usize,
    break_jumps: Vec<usize>,
    continue_jumps: Vec<usize>,
    /// Compilation-scope index at loop entry; break/continue from a scope
    /// other than this one crossed a function boundary.
    scope_index: usize,
}

#[derive(Debug, Clone)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Val>,
}

pub struct Compiler {
    constants: Vec<Val>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
    scope_index: usize,
    loop_contexts: Vec<LoopContext>,
    /// Global slot -> positioned error for identifiers auto-defined during
    /// compilation of inner scopes. The host seeds these into the globals
    /// array so runtime reads yield a descriptive Error value.
    undefined_globals: HashMap<usize, ErrorVal>,
    registry: Rc<Registry>,
}

impl Compiler {
    /// Fresh compiler: builtin symbols at their registry ordinals, then one
    /// symbol per class namespace.
    pub fn new(registry: Rc<Registry>) -> Self {
        let mut symbol_table = SymbolTable::new();
        for (i, def) in registry.defs().iter().enumerate() {
            symbol_table.define_builtin(i, def.name);
        }
        let base = registry.len();
        for (i, class) in CLASS_NAMES.iter().enumerate() {
            symbol_table.define_builtin(base + i, class);
        }

        Compiler::with_table(registry, symbol_table, Vec::new())
    }

    /// Continues compilation over an existing session's symbol table and
    /// constant pool.
    pub fn new_with_state(registry: Rc<Registry>, symbol_table: SymbolTable, constants: Vec<Val>) -> Self {
        Compiler::with_table(registry, symbol_table, constants)
    }

    fn with_table(registry: Rc<Registry>, symbol_table: SymbolTable, constants: Vec<Val>) -> Self {
        Compiler {
            constants,
            symbol_table,
            scopes: vec![CompilationScope::default()],
            scope_index: 0,
            loop_contexts: Vec::new(),
            undefined_globals: HashMap::new(),
            registry,
        }
    }

    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.scopes[self.scope_index].instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Hands the symbol table and constant pool back to the session.
    pub fn into_state(self) -> (SymbolTable, Vec<Val>) {
        (self.symbol_table, self.constants)
    }

    pub fn undefined_globals(&self) -> &HashMap<usize, ErrorVal> {
        &self.undefined_globals
    }

    pub fn compile(&mut self, program: &Program) -> Result<()> {
        trace!(statements = program.statements.len(), "compiling program");
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression { expression, .. } => {
                self.compile_expr(expression)?;
                self.emit(Op::Pop, &[]);
            }

            Stmt::Let {
                name,
                value,
                unblock,
                error_pipe,
                ..
            } => self.compile_let(name, value, *unblock, *error_pipe)?,

            Stmt::Return { value, .. } => {
                self.compile_expr(value)?;
                self.emit(Op::ReturnValue, &[]);
            }

            Stmt::While { condition, body, .. } => {
                // Statement form: the loop's null result is not observable.
                self.compile_loop(condition, body, None)?;
                self.emit(Op::Pop, &[]);
            }

            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.compile_stmt(init)?;
                }
                match condition {
                    Some(cond) => {
                        self.compile_loop(cond, body, update.as_ref())?;
                        self.emit(Op::Pop, &[]);
                    }
                    None => {
                        // An omitted condition loops forever.
                        let loop_start = self.current_len();
                        self.enter_loop(loop_start);
                        self.emit(Op::True, &[]);
                        let exit_jump = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);
                        self.compile_block(body)?;
                        if let Some(update) = update {
                            self.compile_expr(update)?;
                            self.emit(Op::Pop, &[]);
                        }
                        self.emit(Op::Jump, &[loop_start]);
                        let after = self.current_len();
                        self.change_operand(exit_jump, after);
                        self.exit_loop();
                        self.emit(Op::Null, &[]);
                        self.emit(Op::Pop, &[]);
                    }
                }
            }

            Stmt::Break { token } => {
                let pos = self.emit(Op::Jump, &[PATCH_PLACEHOLDER]);
                if !self.register_break(pos) {
                    bail!(
                        "line {}, column {}: break statement not inside a loop",
                        token.line,
                        token.column
                    );
                }
            }

            Stmt::Continue { token } => {
                let pos = self.emit(Op::Jump, &[PATCH_PLACEHOLDER]);
                if !self.register_continue(pos) {
                    bail!(
                        "line {}, column {}: continue statement not inside a loop",
                        token.line,
                        token.column
                    );
                }
            }

            Stmt::Suppress { inner, .. } => {
                match inner.as_ref() {
                    Stmt::Expression { expression, .. } => self.compile_expr(expression)?,
                    other => self.compile_stmt(other)?,
                }
                self.emit(Op::Suppress, &[]);
            }

            Stmt::BlockDirective { inner, .. } => self.compile_block_directive(inner)?,
        }
        Ok(())
    }

    fn compile_let(&mut self, name: &Ident, value: &Expr, unblock: bool, error_pipe: bool) -> Result<()> {
        let symbol = self.symbol_table.define(&name.value);
        self.compile_expr(value)?;

        if error_pipe {
            // Bind the Error itself; a successful value becomes null.
            self.emit(Op::IsError, &[]);
            let not_err = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);
            self.emit_set(&symbol);
            let done = self.emit(Op::Jump, &[PATCH_PLACEHOLDER]);
            let false_branch = self.current_len();
            self.change_operand(not_err, false_branch);
            self.emit(Op::Pop, &[]);
            self.emit(Op::Null, &[]);
            self.emit_set(&symbol);
            let after = self.current_len();
            self.change_operand(done, after);
            return Ok(());
        }

        if unblock {
            // Swallow an Error and bind null; bind the value otherwise.
            self.emit(Op::IsError, &[]);
            let not_err = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);
            self.emit(Op::Pop, &[]);
            self.emit(Op::Null, &[]);
            self.emit_set(&symbol);
            let done = self.emit(Op::Jump, &[PATCH_PLACEHOLDER]);
            let false_branch = self.current_len();
            self.change_operand(not_err, false_branch);
            self.emit_set(&symbol);
            let after = self.current_len();
            self.change_operand(done, after);
            return Ok(());
        }

        self.emit_set(&symbol);
        Ok(())
    }

    fn compile_block_directive(&mut self, inner: &Stmt) -> Result<()> {
        if let Stmt::Let { token, name, value, .. } = inner {
            let symbol = self.symbol_table.define(&name.value);
            self.compile_expr(value)?;

            // A reference on this very line that could not be resolved is a
            // definite failure; bake the error in and abort the program at
            // this point.
            let pending = self
                .undefined_globals
                .values()
                .find(|e| e.line == token.line)
                .cloned();
            if let Some(err) = pending {
                let idx = self.add_constant(Val::Error(Rc::new(err)));
                self.emit(Op::Constant, &[idx]);
                self.emit(Op::ErrorExit, &[]);
                return Ok(());
            }

            self.emit(Op::IsError, &[]);
            let not_err = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);
            self.emit(Op::ErrorExit, &[]);
            let after = self.current_len();
            self.change_operand(not_err, after);
            self.emit_set(&symbol);
            return Ok(());
        }

        match inner {
            Stmt::Expression { expression, .. } => self.compile_expr(expression)?,
            other => return self.compile_stmt(other),
        }
        self.emit(Op::IsError, &[]);
        let not_err = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);
        self.emit(Op::ErrorExit, &[]);
        let after = self.current_len();
        self.change_operand(not_err, after);
        Ok(())
    }

    /// Shared body for `while` and conditioned `for`: condition, guarded
    /// exit, body, optional update, backward jump. Statement lowering keeps
    /// each iteration stack-neutral; the loop itself evaluates to null.
    fn compile_loop(&mut self, condition: &Expr, body: &BlockStmt, update: Option<&Expr>) -> Result<()> {
        let loop_start = self.current_len();
        self.enter_loop(loop_start);

        self.compile_expr(condition)?;
        let exit_jump = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);

        self.compile_block(body)?;
        if let Some(update) = update {
            self.compile_expr(update)?;
            self.emit(Op::Pop, &[]);
        }
        self.emit(Op::Jump, &[loop_start]);

        let after = self.current_len();
        self.change_operand(exit_jump, after);
        self.exit_loop();
        self.emit(Op::Null, &[]);
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStmt) -> Result<()> {
        for stmt in &block.statements {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Integer { value, .. } => {
                let idx = self.add_constant(Val::Int(*value));
                self.emit(Op::Constant, &[idx]);
            }
            Expr::Float { value, .. } => {
                let idx = self.add_constant(Val::Float(*value));
                self.emit(Op::Constant, &[idx]);
            }
            Expr::Str { value, .. } => {
                let idx = self.add_constant(Val::string(value.clone()));
                self.emit(Op::Constant, &[idx]);
            }
            Expr::Boolean { value, .. } => {
                self.emit(if *value { Op::True } else { Op::False }, &[]);
            }
            Expr::Null { .. } => {
                self.emit(Op::Null, &[]);
            }

            Expr::Prefix {
                token, operator, right, ..
            } => {
                self.compile_expr(right)?;
                match operator.as_str() {
                    "!" => {
                        self.emit(Op::Bang, &[]);
                    }
                    "-" => {
                        self.emit(Op::Negate, &[]);
                    }
                    "<<" => {
                        // Error-pipe as an expression: an Error stays, any
                        // other value becomes null.
                        self.emit(Op::IsError, &[]);
                        let not_err = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);
                        let done = self.emit(Op::Jump, &[PATCH_PLACEHOLDER]);
                        let false_branch = self.current_len();
                        self.change_operand(not_err, false_branch);
                        self.emit(Op::Pop, &[]);
                        self.emit(Op::Null, &[]);
                        let after = self.current_len();
                        self.change_operand(done, after);
                    }
                    other => bail!(
                        "line {}, column {}: Unknown operator: {}",
                        token.line,
                        token.column,
                        other
                    ),
                }
            }

            Expr::Infix {
                token,
                operator,
                left,
                right,
            } => self.compile_infix(token.line, token.column, operator, left, right)?,

            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                self.compile_expr(condition)?;
                let not_truthy = self.emit(Op::JumpNotTruthy, &[PATCH_PLACEHOLDER]);

                self.compile_block(consequence)?;
                if self.last_instruction_is(Op::Pop) {
                    self.remove_last_pop();
                }
                let jump_over_alt = self.emit(Op::Jump, &[PATCH_PLACEHOLDER]);

                let after_consequence = self.current_len();
                self.change_operand(not_truthy, after_consequence);

                match alternative {
                    None => {
                        // The if-expression still needs a value.
                        self.emit(Op::Null, &[]);
                    }
                    Some(alt) => {
                        self.compile_block(alt)?;
                        if self.last_instruction_is(Op::Pop) {
                            self.remove_last_pop();
                        }
                    }
                }

                let after_alternative = self.current_len();
                self.change_operand(jump_over_alt, after_alternative);
            }

            Expr::While { condition, body, .. } => {
                self.compile_loop(condition, body, None)?;
            }

            Expr::Function {
                parameters, body, name, ..
            } => {
                self.enter_scope();

                if !name.is_empty() {
                    self.symbol_table.define_function_name(name);
                }
                for param in parameters {
                    self.symbol_table.define(&param.value);
                }

                self.compile_block(body)?;

                if self.last_instruction_is(Op::Pop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(Op::ReturnValue) {
                    self.emit(Op::Return, &[]);
                }

                let free_symbols = self.symbol_table.free_symbols.clone();
                let num_locals = self.symbol_table.num_definitions;
                let instructions = self.leave_scope();

                for symbol in &free_symbols {
                    self.load_symbol(symbol);
                }

                let func = CompiledFunction {
                    instructions,
                    num_locals,
                    num_parameters: parameters.len(),
                };
                let idx = self.add_constant(Val::Function(Rc::new(func)));
                self.emit(Op::Closure, &[idx, free_symbols.len()]);
            }

            Expr::Call {
                token,
                function,
                arguments,
                block,
            } => {
                self.compile_expr(function)?;
                for arg in arguments {
                    self.compile_expr(arg)?;
                }

                let mut argc = arguments.len();
                if let Some(block) = block {
                    // Trailing block: an implicit zero-parameter callback
                    // appended as the last argument.
                    let callback = Expr::Function {
                        token: token.clone(),
                        parameters: Vec::new(),
                        body: block.clone(),
                        name: String::new(),
                    };
                    self.compile_expr(&callback)?;
                    argc += 1;
                }

                self.emit(Op::Call, &[argc]);
            }

            Expr::Array { elements, .. } => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.emit(Op::Array, &[elements.len()]);
            }

            Expr::Hash { pairs, .. } => {
                // Deterministic emission order: sort keys by their printed
                // form. Duplicate keys silently overwrite at runtime.
                let mut sorted: Vec<&(Expr, Expr)> = pairs.iter().collect();
                sorted.sort_by_key(|(k, _)| k.to_string());
                for (key, value) in sorted {
                    self.compile_expr(key)?;
                    self.compile_expr(value)?;
                }
                self.emit(Op::Hash, &[pairs.len() * 2]);
            }

            Expr::Index { left, index, .. } => {
                self.compile_expr(left)?;
                self.compile_expr(index)?;
                self.emit(Op::Index, &[]);
            }

            Expr::Dot { left, right, .. } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(Op::Dot, &[]);
            }

            Expr::Ident(ident) => self.compile_ident(ident)?,
        }
        Ok(())
    }

    fn compile_infix(&mut self, line: u32, column: u32, operator: &str, left: &Expr, right: &Expr) -> Result<()> {
        // Only `>` has an opcode; `<` swaps operands, `<=`/`>=` negate.
        match operator {
            "<" => {
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(Op::GreaterThan, &[]);
                return Ok(());
            }
            "<=" => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(Op::GreaterThan, &[]);
                self.emit(Op::Bang, &[]);
                return Ok(());
            }
            ">=" => {
                self.compile_expr(right)?;
                self.compile_expr(left)?;
                self.emit(Op::GreaterThan, &[]);
                self.emit(Op::Bang, &[]);
                return Ok(());
            }
            _ => {}
        }

        self.compile_expr(left)?;
        self.compile_expr(right)?;

        match operator {
            "+" => {
                self.emit(Op::Add, &[]);
            }
            "-" => {
                self.emit(Op::Sub, &[]);
            }
            "*" => {
                self.emit(Op::Mul, &[]);
            }
            "/" => {
                self.emit(Op::Div, &[]);
            }
            "%" => {
                self.emit(Op::Mod, &[]);
            }
            ">" => {
                self.emit(Op::GreaterThan, &[]);
            }
            "==" => {
                self.emit(Op::Equal, &[]);
            }
            "!=" => {
                self.emit(Op::NotEqual, &[]);
            }
            "and" => {
                self.emit(Op::And, &[]);
            }
            "or" => {
                self.emit(Op::Or, &[]);
            }
            "=" => {
                let Expr::Ident(ident) = left else {
                    bail!(
                        "line {}, column {}: Expected identifier for assignment, got {}",
                        line,
                        column,
                        left
                    );
                };
                let Some(symbol) = self.symbol_table.resolve(&ident.value) else {
                    bail!(
                        "line {}, column {}: Undefined variable {}",
                        ident.token.line,
                        ident.token.column,
                        ident.value
                    );
                };
                self.emit_set(&symbol);
            }
            other => bail!("line {}, column {}: Unknown operator {}", line, column, other),
        }
        Ok(())
    }

    fn compile_ident(&mut self, ident: &Ident) -> Result<()> {
        let symbol = match self.symbol_table.resolve(&ident.value) {
            Some(symbol) => symbol,
            None => {
                if self.scope_index > 0 {
                    // Inside a function an unknown name may be defined
                    // later: allocate a global slot now and remember a
                    // positioned error for the host to seed.
                    let symbol = self.symbol_table.define_in_outermost(&ident.value);
                    self.undefined_globals.insert(
                        symbol.index,
                        ErrorVal::at(
                            format!("Undefined variable {}", ident.value),
                            ident.token.line,
                            ident.token.column,
                        ),
                    );
                    symbol
                } else {
                    bail!(
                        "line {}, column {}: Undefined variable {}",
                        ident.token.line,
                        ident.token.column,
                        ident.value
                    );
                }
            }
        };

        // Classed intrinsics must be reached through their namespace so
        // same-named functions in different classes cannot collide.
        if symbol.scope == Scope::Builtin {
            if let Some(def) = self.registry.get(symbol.index) {
                if !def.class.is_empty() {
                    bail!(
                        "line {}, column {}: Builtin '{}' is in a class. Maybe use {}.{} instead.",
                        ident.token.line,
                        ident.token.column,
                        ident.value,
                        def.class,
                        ident.value
                    );
                }
            }
        }

        self.load_symbol(&symbol);
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &Symbol) {
        match symbol.scope {
            Scope::Global => self.emit(Op::GetGlobal, &[symbol.index]),
            Scope::Local => self.emit(Op::GetLocal, &[symbol.index]),
            Scope::Builtin => self.emit(Op::GetBuiltin, &[symbol.index]),
            Scope::Free => self.emit(Op::GetFree, &[symbol.index]),
            Scope::Function => self.emit(Op::CurrentClosure, &[]),
        };
    }

    fn emit_set(&mut self, symbol: &Symbol) {
        if symbol.scope == Scope::Global {
            self.emit(Op::SetGlobal, &[symbol.index]);
        } else {
            self.emit(Op::SetLocal, &[symbol.index]);
        }
    }

    // -- emit / patch machinery -------------------------------------------

    fn add_constant(&mut self, value: Val) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn emit(&mut self, op: Op, operands: &[usize]) -> usize {
        let ins = make(op, operands);
        let pos = self.add_instruction(&ins);
        self.set_last_instruction(op, pos);
        pos
    }

    fn add_instruction(&mut self, ins: &[u8]) -> usize {
        let scope = &mut self.scopes[self.scope_index];
        let pos = scope.instructions.len();
        scope.instructions.extend_from_slice(ins);
        pos
    }

    fn set_last_instruction(&mut self, op: Op, pos: usize) {
        let scope = &mut self.scopes[self.scope_index];
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = Some(EmittedInstruction { opcode: op, position: pos });
    }

    fn last_instruction_is(&self, op: Op) -> bool {
        let scope = &self.scopes[self.scope_index];
        !scope.instructions.is_empty() && scope.last_instruction.map(|ins| ins.opcode) == Some(op)
    }

    fn remove_last_pop(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        if let Some(last) = scope.last_instruction {
            scope.instructions.truncate(last.position);
            scope.last_instruction = scope.previous_instruction;
        }
    }

    fn replace_last_pop_with_return(&mut self) {
        let scope = &mut self.scopes[self.scope_index];
        if let Some(last) = &mut scope.last_instruction {
            let pos = last.position;
            let new_ins = make(Op::ReturnValue, &[]);
            scope.instructions[pos..pos + new_ins.len()].copy_from_slice(&new_ins);
            last.opcode = Op::ReturnValue;
        }
    }

    fn change_operand(&mut self, op_pos: usize, operand: usize) {
        let scope = &mut self.scopes[self.scope_index];
        let op = Op::from_u8(scope.instructions[op_pos]).expect("patch target is an opcode");
        let new_ins = make(op, &[operand]);
        scope.instructions[op_pos..op_pos + new_ins.len()].copy_from_slice(&new_ins);
    }

    fn current_len(&self) -> usize {
        self.scopes[self.scope_index].instructions.len()
    }

    /// Unpatched jump scan used by tests: true when some jump still has the
    /// placeholder operand.
    pub fn has_unpatched_jumps(instructions: &[u8]) -> bool {
        let mut i = 0;
        while i < instructions.len() {
            let Some(op) = Op::from_u8(instructions[i]) else {
                i += 1;
                continue;
            };
            let widths = op.operand_widths();
            if matches!(op, Op::Jump | Op::JumpNotTruthy) && read_u16(&instructions[i + 1..]) as usize == PATCH_PLACEHOLDER
            {
                return true;
            }
            i += 1 + widths.iter().sum::<usize>();
        }
        false
    }

    // -- scope and loop stacks --------------------------------------------

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.scope_index += 1;
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().expect("scope underflow");
        self.scope_index -= 1;
        let outer = self.symbol_table.outer.take().expect("left the outermost scope");
        self.symbol_table = *outer;
        scope.instructions
    }

    fn enter_loop(&mut self, loop_start: usize) {
        self.loop_contexts.push(LoopContext {
            loop_start,
            break_jumps: Vec::new(),
            continue_jumps: Vec::new(),
            scope_index: self.scope_index,
        });
    }

    /// Patches pending breaks to the current position and continues to the
    /// loop start, then discards the context.
    fn exit_loop(&mut self) {
        let Some(ctx) = self.loop_contexts.pop() else {
            return;
        };
        let after = self.current_len();
        for pos in ctx.break_jumps {
            self.change_operand(pos, after);
        }
        for pos in ctx.continue_jumps {
            self.change_operand(pos, ctx.loop_start);
        }
    }

    fn register_break(&mut self, pos: usize) -> bool {
        let scope_index = self.scope_index;
        match self.loop_contexts.last_mut() {
            Some(ctx) if ctx.scope_index == scope_index => {
                ctx.break_jumps.push(pos);
                true
            }
            _ => false,
        }
    }

    fn register_continue(&mut self, pos: usize) -> bool {
        let scope_index = self.scope_index;
        match self.loop_contexts.last_mut() {
            Some(ctx) if ctx.scope_index == scope_index => {
                ctx.continue_jumps.push(pos);
                true
            }
            _ => false,
        }
    }
}
