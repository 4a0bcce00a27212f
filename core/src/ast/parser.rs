//! Pratt parser over the token stream.
//!
//! Errors are collected rather than returned: a statement that fails to
//! parse is dropped and the parser resynchronizes at the next statement
//! boundary. Callers must treat a non-empty `errors()` as fatal for the
//! parsed unit.

use crate::ast::{BlockStmt, Expr, Ident, Program, Stmt};
use crate::token::{Lexer, Token, TokenKind};

/// Operator binding strength, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Dot,
    Call,
    Index,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Assign | TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::Dot => Precedence::Dot,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        let mut p = Parser {
            lexer,
            cur: Token::eof(0, 0),
            peek: Token::eof(0, 0),
            errors: Vec::new(),
        };
        p.next_token();
        p.next_token();
        p
    }

    pub fn from_source(source: &str) -> Self {
        Parser::new(Lexer::new(source))
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.cur = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.peek_error(kind);
            false
        }
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek.kind)
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(self.cur.kind)
    }

    fn peek_error(&mut self, kind: TokenKind) {
        let context = self.error_context(self.peek.line, self.peek.column);
        self.errors.push(format!(
            "line {}, column {}: expected next token to be {}, got {} instead\n{}",
            self.peek.line, self.peek.column, kind, self.peek.kind, context
        ));
    }

    fn no_prefix_parse_error(&mut self) {
        let context = self.error_context(self.cur.line, self.cur.column);
        self.errors.push(format!(
            "line {}, column {}: No prefix parse function for {} found.\n{}",
            self.cur.line, self.cur.column, self.cur.kind, context
        ));
    }

    /// Renders the offending source line with a caret under the error column.
    fn error_context(&self, line: u32, column: u32) -> String {
        let input = self.lexer.input();
        if input.is_empty() || line < 1 {
            return String::new();
        }
        let Some(src_line) = input.split('\n').nth((line - 1) as usize) else {
            return String::new();
        };
        let mut pointer = String::new();
        if column >= 1 && (column as usize) <= src_line.chars().count() {
            pointer = " ".repeat((column - 1) as usize) + "^";
        }
        format!("  {}\n  {}", src_line, pointer)
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Let => self.parse_let_statement(false),
            TokenKind::Unblock => {
                if !self.expect_peek(TokenKind::Let) {
                    return None;
                }
                self.parse_let_statement(true)
            }
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Break => {
                let token = self.cur.clone();
                if self.peek_is(TokenKind::Semicolon) {
                    self.next_token();
                }
                Some(Stmt::Break { token })
            }
            TokenKind::Continue => {
                let token = self.cur.clone();
                if self.peek_is(TokenKind::Semicolon) {
                    self.next_token();
                }
                Some(Stmt::Continue { token })
            }
            TokenKind::Suppress => self.parse_wrapped_statement(true),
            TokenKind::Block => self.parse_wrapped_statement(false),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self, unblock: bool) -> Option<Stmt> {
        let token = self.cur.clone();

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = Ident {
            token: self.cur.clone(),
            value: self.cur.literal.clone(),
        };

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let mut error_pipe = false;
        if self.cur_is(TokenKind::ErrorPipe) {
            error_pipe = true;
            self.next_token();
        }

        let mut value = self.parse_expression(Precedence::Lowest)?;
        if let Expr::Function { name: fn_name, .. } = &mut value {
            *fn_name = name.value.clone();
        }

        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }

        Some(Stmt::Let {
            token,
            name,
            value,
            unblock,
            error_pipe,
        })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Return { token, value })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Stmt::Expression { token, expression })
    }

    /// `suppress` and `block` share a shape: both wrap either a let
    /// statement or a bare expression.
    fn parse_wrapped_statement(&mut self, suppress: bool) -> Option<Stmt> {
        let token = self.cur.clone();
        self.next_token();

        let inner = match self.cur.kind {
            TokenKind::Let => self.parse_let_statement(false)?,
            TokenKind::Unblock => {
                if !self.expect_peek(TokenKind::Let) {
                    return None;
                }
                self.parse_let_statement(true)?
            }
            _ => {
                let inner_token = self.cur.clone();
                let expression = self.parse_expression(Precedence::Lowest)?;
                if self.peek_is(TokenKind::Semicolon) {
                    self.next_token();
                }
                Stmt::Expression {
                    token: inner_token,
                    expression,
                }
            }
        };

        let inner = Box::new(inner);
        Some(if suppress {
            Stmt::Suppress { token, inner }
        } else {
            Stmt::BlockDirective { token, inner }
        })
    }

    fn parse_while_statement(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();

        let condition = if self.peek_is(TokenKind::LParen) {
            self.next_token();
            self.next_token();
            let cond = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
            cond
        } else {
            // Bare `while { ... }` loops forever.
            Expr::Boolean {
                token: token.clone(),
                value: true,
            }
        };

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Stmt::While { token, condition, body })
    }

    fn parse_for_statement(&mut self) -> Option<Stmt> {
        let token = self.cur.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();

        // init; the sub-statement parser leaves the cursor on its trailing
        // semicolon.
        let init = if self.cur_is(TokenKind::Semicolon) {
            None
        } else {
            let stmt = self.parse_statement()?;
            if !self.cur_is(TokenKind::Semicolon) && !self.expect_peek(TokenKind::Semicolon) {
                return None;
            }
            Some(Box::new(stmt))
        };
        self.next_token();

        let condition = if self.cur_is(TokenKind::Semicolon) {
            None
        } else {
            let cond = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Semicolon) {
                return None;
            }
            Some(cond)
        };
        self.next_token();

        let update = if self.cur_is(TokenKind::RParen) {
            None
        } else {
            let update = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
            Some(update)
        };

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();

        Some(Stmt::For {
            token,
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_block_statement(&mut self) -> BlockStmt {
        let token = self.cur.clone();
        let mut statements = Vec::new();
        self.next_token();
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        BlockStmt { token, statements }
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            left = match self.peek.kind {
                TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Asterisk
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Le
                | TokenKind::Ge
                | TokenKind::And
                | TokenKind::Or
                | TokenKind::Assign => {
                    self.next_token();
                    self.parse_infix_expression(left)?
                }
                TokenKind::LParen => {
                    self.next_token();
                    self.parse_call_expression(left)?
                }
                TokenKind::LBracket => {
                    self.next_token();
                    self.parse_index_expression(left)?
                }
                TokenKind::Dot => {
                    self.next_token();
                    self.parse_dot_expression(left)?
                }
                _ => return Some(left),
            };
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Ident => Some(Expr::Ident(Ident {
                token: self.cur.clone(),
                value: self.cur.literal.clone(),
            })),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::Float => self.parse_float_literal(),
            TokenKind::Str => Some(Expr::Str {
                token: self.cur.clone(),
                value: self.cur.literal.clone(),
            }),
            TokenKind::True | TokenKind::False => Some(Expr::Boolean {
                token: self.cur.clone(),
                value: self.cur_is(TokenKind::True),
            }),
            TokenKind::Null => Some(Expr::Null {
                token: self.cur.clone(),
            }),
            TokenKind::Bang | TokenKind::Minus | TokenKind::ErrorPipe => self.parse_prefix_expression(),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::While => self.parse_while_expression(),
            TokenKind::Function => self.parse_function_literal(),
            _ => {
                self.no_prefix_parse_error();
                None
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        match token.literal.parse::<i64>() {
            Ok(value) => Some(Expr::Integer { token, value }),
            Err(_) => {
                self.errors.push(format!(
                    "line {}, column {}: Could not parse {:?} as an integer.",
                    token.line, token.column, token.literal
                ));
                None
            }
        }
    }

    fn parse_float_literal(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        match token.literal.parse::<f64>() {
            Ok(value) => Some(Expr::Float { token, value }),
            Err(_) => {
                self.errors.push(format!(
                    "line {}, column {}: Could not parse {:?} as a float.",
                    token.line, token.column, token.literal
                ));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        let operator = token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            token,
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur.clone();
        let operator = token.literal.clone();
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Some(Expr::Infix {
            token,
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement();
        let alternative = self.parse_elif_else_chain();

        Some(Expr::If {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    /// `elif` is sugar for an `if` nested in the alternative block; the
    /// chain recurses until a plain `el` or nothing.
    fn parse_elif_else_chain(&mut self) -> Option<BlockStmt> {
        if !self.peek_is(TokenKind::Else) && !self.peek_is(TokenKind::Elif) {
            return None;
        }
        self.next_token();

        if self.cur_is(TokenKind::Elif) {
            let token = self.cur.clone();
            if !self.expect_peek(TokenKind::LParen) {
                return None;
            }
            self.next_token();
            let condition = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            let consequence = self.parse_block_statement();
            let alternative = self.parse_elif_else_chain();

            let nested = Expr::If {
                token: token.clone(),
                condition: Box::new(condition),
                consequence,
                alternative,
            };
            Some(BlockStmt {
                token: token.clone(),
                statements: vec![Stmt::Expression {
                    token,
                    expression: nested,
                }],
            })
        } else {
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block_statement())
        }
    }

    fn parse_while_expression(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::While {
            token,
            condition: Box::new(condition),
            body,
        })
    }

    fn parse_function_literal(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement();
        Some(Expr::Function {
            token,
            parameters,
            body,
            name: String::new(),
        })
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<Ident>> {
        let mut identifiers = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(identifiers);
        }

        self.next_token();
        identifiers.push(Ident {
            token: self.cur.clone(),
            value: self.cur.literal.clone(),
        });

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            identifiers.push(Ident {
                token: self.cur.clone(),
                value: self.cur.literal.clone(),
            });
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expr) -> Option<Expr> {
        let token = self.cur.clone();
        let arguments = self.parse_expression_list(TokenKind::RParen)?;

        // Trailing-brace block: lowered to an implicit zero-parameter
        // callback argument by the compiler.
        let block = if self.peek_is(TokenKind::LBrace) {
            self.next_token();
            Some(self.parse_block_statement())
        } else {
            None
        };

        Some(Expr::Call {
            token,
            function: Box::new(function),
            arguments,
            block,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur.clone();
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expr::Index {
            token,
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_dot_expression(&mut self, left: Expr) -> Option<Expr> {
        let token = self.cur.clone();
        self.next_token();

        // The right of `.` is a key name: identifiers become string
        // literals so `h.key` and `h["key"]` hit the same pair.
        let right = if self.cur_is(TokenKind::Ident) {
            Expr::Str {
                token: Token::new(TokenKind::Str, self.cur.literal.clone(), self.cur.line, self.cur.column),
                value: self.cur.literal.clone(),
            }
        } else {
            self.parse_expression(Precedence::Dot)?
        };

        Some(Expr::Dot {
            token,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expr::Array { token, elements })
    }

    fn parse_hash_literal(&mut self) -> Option<Expr> {
        let token = self.cur.clone();
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if !self.peek_is(TokenKind::RBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }
        Some(Expr::Hash { token, pairs })
    }

    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }
}
