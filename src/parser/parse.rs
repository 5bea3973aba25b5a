//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: Parsing `func`/`proc` declarations
//! - `statements`: Parsing statements (return, set, if, expression)
//! - `expressions`: Parsing expressions with precedence climbing
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! The parser pulls tokens from the [`Lexer`] one at a time and hands back
//! whatever it read speculatively through [`Lexer::revert`]. Parsing consumes
//! the parser, so one instance can never be driven twice.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};

/// What kind of failure a [`ParseError`] reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The token stream does not match the grammar
    Syntax,
    /// A `func`/`proc` declaration appeared inside a function body
    NestedFunction,
    /// The lexer rejected the input
    Lex,
}

/// Parser error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Parse error at line {}, column {}: {}",
    .location.line,
    .location.column,
    .message
)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub location: SourceLocation,
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>, location: SourceLocation) -> Self {
        ParseError {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            location,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            kind: ParseErrorKind::Lex,
            message: err.message,
            location: err.location,
        }
    }
}

/// Deepest allowed nesting of parentheses, unary signs, call arguments and
/// `if` blocks. Every later pass recurses over the tree, so this also bounds
/// their stack use.
pub const MAX_NESTING: usize = 128;

/// Recursive descent parser for the stack language
pub struct Parser {
    pub(crate) lexer: Lexer,
    depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::with_lexer(Lexer::new(source))
    }

    pub fn with_lexer(lexer: Lexer) -> Self {
        Self { lexer, depth: 0 }
    }

    /// Parse the entire program: `function_declaration*` followed by end of input
    pub fn parse_program(mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while let Some(function) = self.parse_function_declaration()? {
            program.functions.push(function);
        }

        let trailing = self.next()?;
        if !trailing.is_eof() {
            return Err(ParseError::syntax(
                format!("Expected end of input, found {}", trailing),
                trailing.location(),
            ));
        }

        Ok(program)
    }

    // ===== Helper methods =====

    /// Enter one nesting level, opened by the token at `location`
    pub(crate) fn descend(&mut self, location: SourceLocation) -> Result<(), ParseError> {
        if self.depth == MAX_NESTING {
            return Err(ParseError::syntax(
                format!("Code nested too deeply (limit {})", MAX_NESTING),
                location,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn next(&mut self) -> Result<Token, ParseError> {
        Ok(self.lexer.next_token()?)
    }

    pub(crate) fn revert(&mut self, token: Token) {
        self.lexer.revert(token);
    }

    pub(crate) fn peek(&mut self) -> Result<Token, ParseError> {
        let token = self.next()?;
        self.revert(token.clone());
        Ok(token)
    }

    /// Consume the next token if it has the same variant as `token`
    pub(crate) fn match_token(&mut self, token: &Token) -> Result<bool, ParseError> {
        let next = self.next()?;
        if std::mem::discriminant(&next) == std::mem::discriminant(token) {
            Ok(true)
        } else {
            self.revert(next);
            Ok(false)
        }
    }

    pub(crate) fn expect_token(
        &mut self,
        token: &Token,
        message: &str,
    ) -> Result<Token, ParseError> {
        let next = self.next()?;
        if std::mem::discriminant(&next) == std::mem::discriminant(token) {
            Ok(next)
        } else {
            Err(ParseError::syntax(
                format!("{}, found {}", message, next),
                next.location(),
            ))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(&Token::LParen(DUMMY), &format!("Expected '(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(&Token::RParen(DUMMY), &format!("Expected ')' {ctx}"))
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(&Token::LBrace(DUMMY), &format!("Expected '{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(&Token::RBrace(DUMMY), &format!("Expected '}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect_token(&Token::Semicolon(DUMMY), &format!("Expected ';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<String, ParseError> {
        match self.next()? {
            Token::Ident(name, _) => Ok(name),
            other => Err(ParseError::syntax(
                format!("Expected identifier {ctx}, found {}", other),
                other.location(),
            )),
        }
    }

    /// Fail with "Expected expression" at the next token
    pub(crate) fn missing_expression(&mut self, ctx: &str) -> ParseError {
        match self.peek() {
            Ok(token) => ParseError::syntax(
                format!("Expected expression {ctx}, found {}", token),
                token.location(),
            ),
            Err(err) => err,
        }
    }
}

/// Placeholder location for tokens used only as variant patterns
pub(crate) const DUMMY: SourceLocation = SourceLocation { line: 0, column: 0 };
