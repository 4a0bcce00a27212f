//! AST nodes for Squid programs.
//!
//! Every node keeps the token that introduced it so diagnostics can point at
//! the original source position. Expressions implement `Display`; the printed
//! form doubles as the canonical ordering key for hash-literal compilation.

use std::fmt;

use crate::token::Token;

mod parser;

#[cfg(test)]
mod parser_test;

pub use parser::Parser;

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub token: Token,
    pub value: String,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockStmt {
    pub token: Token,
    pub statements: Vec<Stmt>,
}

impl fmt::Display for BlockStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for stmt in &self.statements {
            write!(f, "{} ", stmt)?;
        }
        write!(f, "}}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer {
        token: Token,
        value: i64,
    },
    Float {
        token: Token,
        value: f64,
    },
    Str {
        token: Token,
        value: String,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Null {
        token: Token,
    },
    Ident(Ident),
    Prefix {
        token: Token,
        operator: String,
        right: Box<Expr>,
    },
    Infix {
        token: Token,
        operator: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        token: Token,
        condition: Box<Expr>,
        consequence: BlockStmt,
        alternative: Option<BlockStmt>,
    },
    While {
        token: Token,
        condition: Box<Expr>,
        body: BlockStmt,
    },
    Function {
        token: Token,
        parameters: Vec<Ident>,
        body: BlockStmt,
        /// Bound by an enclosing `var name = def(...)`; enables recursive
        /// self-reference through the current closure.
        name: String,
    },
    Call {
        token: Token,
        function: Box<Expr>,
        arguments: Vec<Expr>,
        /// Trailing-brace sugar, lowered to an extra zero-parameter function
        /// literal argument.
        block: Option<BlockStmt>,
    },
    Array {
        token: Token,
        elements: Vec<Expr>,
    },
    Hash {
        token: Token,
        pairs: Vec<(Expr, Expr)>,
    },
    Index {
        token: Token,
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Dot {
        token: Token,
        left: Box<Expr>,
        /// Always a string literal; identifiers on the right of `.` are
        /// rewritten during parsing.
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn token(&self) -> &Token {
        match self {
            Expr::Integer { token, .. }
            | Expr::Float { token, .. }
            | Expr::Str { token, .. }
            | Expr::Boolean { token, .. }
            | Expr::Null { token }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::If { token, .. }
            | Expr::While { token, .. }
            | Expr::Function { token, .. }
            | Expr::Call { token, .. }
            | Expr::Array { token, .. }
            | Expr::Hash { token, .. }
            | Expr::Index { token, .. }
            | Expr::Dot { token, .. } => token,
            Expr::Ident(ident) => &ident.token,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer { value, .. } => write!(f, "{}", value),
            Expr::Float { value, .. } => write!(f, "{}", value),
            Expr::Str { value, .. } => write!(f, "{}", value),
            Expr::Boolean { value, .. } => write!(f, "{}", value),
            Expr::Null { .. } => write!(f, "null"),
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Prefix { operator, right, .. } => write!(f, "({}{})", operator, right),
            Expr::Infix {
                operator, left, right, ..
            } => write!(f, "({} {} {})", left, operator, right),
            Expr::If {
                condition,
                consequence,
                alternative,
                ..
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " el {}", alt)?;
                }
                Ok(())
            }
            Expr::While { condition, body, .. } => write!(f, "while ({}) {}", condition, body),
            Expr::Function {
                parameters, body, name, ..
            } => {
                let params: Vec<String> = parameters.iter().map(|p| p.to_string()).collect();
                if name.is_empty() {
                    write!(f, "def({}) {}", params.join(", "), body)
                } else {
                    write!(f, "def<{}>({}) {}", name, params.join(", "), body)
                }
            }
            Expr::Call {
                function,
                arguments,
                block,
                ..
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, args.join(", "))?;
                if let Some(block) = block {
                    write!(f, " {}", block)?;
                }
                Ok(())
            }
            Expr::Array { elements, .. } => {
                let elems: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
            Expr::Hash { pairs, .. } => {
                let pairs: Vec<String> = pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expr::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expr::Dot { left, right, .. } => write!(f, "({}.{})", left, right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        token: Token,
        name: Ident,
        value: Expr,
        /// `unblock var x = E`: an Error result is swallowed and `x` bound
        /// to null.
        unblock: bool,
        /// `var x = << E`: `x` receives the Error value (or null when E
        /// succeeded). Wins over `unblock` when both are present.
        error_pipe: bool,
    },
    Return {
        token: Token,
        value: Expr,
    },
    Expression {
        token: Token,
        expression: Expr,
    },
    While {
        token: Token,
        condition: Expr,
        body: BlockStmt,
    },
    For {
        token: Token,
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: BlockStmt,
    },
    Break {
        token: Token,
    },
    Continue {
        token: Token,
    },
    /// `suppress <stmt-or-expr>`: evaluate but never display the result.
    Suppress {
        token: Token,
        inner: Box<Stmt>,
    },
    /// `block <stmt-or-expr>`: terminate the program if the result is an
    /// Error value.
    BlockDirective {
        token: Token,
        inner: Box<Stmt>,
    },
}

impl Stmt {
    pub fn token(&self) -> &Token {
        match self {
            Stmt::Let { token, .. }
            | Stmt::Return { token, .. }
            | Stmt::Expression { token, .. }
            | Stmt::While { token, .. }
            | Stmt::For { token, .. }
            | Stmt::Break { token }
            | Stmt::Continue { token }
            | Stmt::Suppress { token, .. }
            | Stmt::BlockDirective { token, .. } => token,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let {
                name,
                value,
                unblock,
                error_pipe,
                ..
            } => {
                if *unblock {
                    write!(f, "unblock ")?;
                }
                write!(f, "var {} = ", name)?;
                if *error_pipe {
                    write!(f, "<< ")?;
                }
                write!(f, "{};", value)
            }
            Stmt::Return { value, .. } => write!(f, "return {};", value),
            Stmt::Expression { expression, .. } => write!(f, "{}", expression),
            Stmt::While { condition, body, .. } => write!(f, "while ({}) {}", condition, body),
            Stmt::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                write!(f, "for (")?;
                if let Some(init) = init {
                    write!(f, "{}", init)?;
                }
                write!(f, "; ")?;
                if let Some(cond) = condition {
                    write!(f, "{}", cond)?;
                }
                write!(f, "; ")?;
                if let Some(update) = update {
                    write!(f, "{}", update)?;
                }
                write!(f, ") {}", body)
            }
            Stmt::Break { .. } => write!(f, "break;"),
            Stmt::Continue { .. } => write!(f, "continue;"),
            Stmt::Suppress { inner, .. } => write!(f, "suppress {}", inner),
            Stmt::BlockDirective { inner, .. } => write!(f, "block {}", inner),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}
