//! Declaration parsing implementation
//!
//! This module handles parsing of top-level function declarations:
//!
//! - Value-returning functions: `func name(params) { ... }`
//! - Void procedures: `proc name(params) { ... }`
//! - The optional `var a, b;` local declaration at the start of a body
//!
//! # Grammar
//!
//! ```text
//! function_decl ::= ("func" | "proc") identifier "(" names ")"
//!                   "{" ("var" names ";")? statement* "}"
//! names         ::= (identifier ("," identifier)*)?
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser, DUMMY};

impl Parser {
    /// Parse one function declaration, or return `None` if the next token
    /// does not start one.
    pub(crate) fn parse_function_declaration(
        &mut self,
    ) -> Result<Option<FunctionDeclaration>, ParseError> {
        let produces_value = match self.next()? {
            Token::Func(_) => true,
            Token::Proc(_) => false,
            other => {
                self.revert(other);
                return Ok(None);
            }
        };

        let name = self.expect_identifier("after 'func'/'proc'")?;

        self.expect_lparen("after function name")?;
        let parameters = self.parse_name_list("in parameter list")?;
        self.expect_rparen("after parameters")?;

        self.expect_lbrace("before function body")?;
        let locals = self.parse_local_declaration()?;
        let body = self.parse_block_statements()?;
        self.expect_rbrace("after function body")?;

        Ok(Some(FunctionDeclaration {
            name,
            parameters,
            locals,
            body,
            produces_value,
        }))
    }

    /// Parse `var a, b, c;` if present
    fn parse_local_declaration(&mut self) -> Result<Vec<String>, ParseError> {
        if !self.match_token(&Token::Var(DUMMY))? {
            return Ok(Vec::new());
        }

        let locals = self.parse_name_list("in 'var' declaration")?;
        self.expect_semicolon("after local declarations")?;
        Ok(locals)
    }

    /// Parse a possibly empty comma-separated list of identifiers.
    /// A comma must always be followed by another identifier.
    pub(crate) fn parse_name_list(&mut self, ctx: &str) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::new();

        match self.next()? {
            Token::Ident(name, _) => names.push(name),
            other => {
                self.revert(other);
                return Ok(names);
            }
        }

        while self.match_token(&Token::Comma(DUMMY))? {
            names.push(self.expect_identifier(&format!("after ',' {ctx}"))?);
        }

        Ok(names)
    }
}
