//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Return: `return;` / `return expr;`
//! - Assignment: `name = expr;`
//! - Conditionals: `if (expr) { ... } else { ... }`
//! - Expression statements: `Print(x);`
//!
//! # Grammar
//!
//! ```text
//! statement ::= return_stmt | set_stmt | if_stmt | expr_stmt
//! block     ::= "{" statement* "}"
//! ```
//!
//! Alternatives are tried in that order. Assignment and expression
//! statements both begin with an identifier: the set parser reads the name
//! and peeks for `=`, reverting both tokens when it is not there.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, ParseErrorKind, Parser, DUMMY};

impl Parser {
    /// Parse statements until one fails to start (normally at the closing brace)
    pub(crate) fn parse_block_statements(&mut self) -> Result<Block, ParseError> {
        let mut statements = Vec::new();

        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }

        Ok(Block::new(statements))
    }

    /// Parse `{ statement* }`
    pub(crate) fn parse_braced_block(&mut self, ctx: &str) -> Result<Block, ParseError> {
        let open = self.expect_lbrace(ctx)?;
        self.descend(open.location())?;
        let block = self.parse_block_statements()?;
        self.expect_rbrace("after block")?;
        self.ascend();
        Ok(block)
    }

    /// Parse a statement, or return `None` when the next token cannot start one
    pub(crate) fn parse_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        if let Some(statement) = self.parse_return_statement()? {
            return Ok(Some(statement));
        }

        if let Some(statement) = self.parse_set_statement()? {
            return Ok(Some(statement));
        }

        if let Some(statement) = self.parse_if_statement()? {
            return Ok(Some(statement));
        }

        if let token @ (Token::Func(_) | Token::Proc(_)) = self.peek()? {
            return Err(ParseError {
                kind: ParseErrorKind::NestedFunction,
                message: format!("Nested function declarations are not supported, found {}", token),
                location: token.location(),
            });
        }

        match self.parse_expression()? {
            Some(expr) => {
                self.expect_semicolon("after expression")?;
                Ok(Some(Statement::Expression(expr)))
            }
            None => Ok(None),
        }
    }

    /// Parse return statement
    fn parse_return_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        if !self.match_token(&Token::Return(DUMMY))? {
            return Ok(None);
        }

        let expr = self.parse_expression()?;
        self.expect_semicolon("after return")?;

        Ok(Some(Statement::Return(expr)))
    }

    /// Parse `name = expr;`
    fn parse_set_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        let name_token = self.next()?;
        let target = match name_token {
            Token::Ident(ref name, _) => name.clone(),
            other => {
                self.revert(other);
                return Ok(None);
            }
        };

        let assign = self.next()?;
        if !matches!(assign, Token::Eq(_)) {
            self.revert(assign);
            self.revert(name_token);
            return Ok(None);
        }

        let value = match self.parse_expression()? {
            Some(value) => value,
            None => return Err(self.missing_expression("after '='")),
        };
        self.expect_semicolon("after assignment")?;

        Ok(Some(Statement::Set { target, value }))
    }

    /// Parse if statement
    fn parse_if_statement(&mut self) -> Result<Option<Statement>, ParseError> {
        if !self.match_token(&Token::If(DUMMY))? {
            return Ok(None);
        }

        self.expect_lparen("after 'if'")?;
        let condition = match self.parse_expression()? {
            Some(condition) => condition,
            None => return Err(self.missing_expression("in if condition")),
        };
        self.expect_rparen("after if condition")?;

        let then_block = self.parse_braced_block("after if condition")?;

        let else_block = if self.match_token(&Token::Else(DUMMY))? {
            Some(self.parse_braced_block("after 'else'")?)
        } else {
            None
        };

        Ok(Some(Statement::If {
            condition,
            then_block,
            else_block,
        }))
    }
}
