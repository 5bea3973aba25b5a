//! Expression parsing implementation
//!
//! This module handles parsing of expressions using precedence climbing
//! for binary operators and recursive descent for atoms.
//!
//! # Supported Expressions
//!
//! - Integer literals and variable references
//! - Function calls: `name(arg, ...)`
//! - Binary operators: `||`, `&&`, `<`, `>`, `==`, `!=`, `+`, `-`, `*`, `/`
//! - Unary `+` and `-`
//! - Parenthesised sub-expressions
//!
//! # Precedence
//!
//! | Level | Operators          |
//! |-------|--------------------|
//! | 0     | `\|\|`             |
//! | 1     | `&&`               |
//! | 2     | `<` `>` `==` `!=`  |
//! | 3     | `+` `-`            |
//! | 4     | `*` `/`            |
//!
//! An operand is an atom followed by every operator binding at least as
//! tightly as the caller's minimum level. Operands of an operator are parsed
//! one level tighter, so operators of equal level fold left to right. Only a
//! rise in precedence recurses. Every entry point returns
//! `Ok(None)` when no expression starts at the current token so callers can
//! treat the expression as optional.
//!
//! # Limits
//!
//! Parentheses, unary signs and call arguments each open a nesting level
//! counted against [`MAX_NESTING`]. Tree height is bounded by the same limit
//! measured from the enclosing block, since the printer parenthesises every
//! binary node and its output must parse again.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser, DUMMY, MAX_NESTING};

/// A parsed expression with the height of its tree
type Measured = (Expression, usize);

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<Option<Expression>, ParseError> {
        let start = self.peek()?.location();
        let Some((expr, height)) = self.parse_binary(0)? else {
            return Ok(None);
        };

        // Printed, a tree of height `h` opens `h - 1` levels below this one
        if self.depth() + height - 1 > MAX_NESTING {
            return Err(too_deep(start));
        }
        Ok(Some(expr))
    }

    /// Parse an atom followed by operators of `min_level` or tighter
    fn parse_binary(&mut self, min_level: u8) -> Result<Option<Measured>, ParseError> {
        let Some((mut left, mut height)) = self.parse_atom()? else {
            return Ok(None);
        };

        loop {
            let token = self.next()?;
            let location = token.location();
            let op = match token.binary_op() {
                Some(op) if op.precedence() >= min_level => op,
                _ => {
                    self.revert(token);
                    break;
                }
            };

            let (right, right_height) = match self.parse_binary(op.precedence() + 1)? {
                Some(right) => right,
                None => {
                    return Err(self.missing_expression(&format!("after '{}'", op.symbol())))
                }
            };

            height = height.max(right_height) + 1;
            if height > MAX_NESTING + 1 {
                return Err(too_deep(location));
            }
            left = Expression::binary(op, left, right);
        }

        Ok(Some((left, height)))
    }

    /// Parse an atom: literal, name, call, parenthesised or signed expression
    fn parse_atom(&mut self) -> Result<Option<Measured>, ParseError> {
        match self.next()? {
            Token::Number(value, _) => Ok(Some((Expression::Number(value), 1))),

            Token::Ident(name, location) => {
                if self.match_token(&Token::LParen(DUMMY))? {
                    self.descend(location)?;
                    let (arguments, height) = self.parse_arguments(&name)?;
                    self.ascend();
                    Ok(Some((Expression::Call { name, arguments }, height + 1)))
                } else {
                    Ok(Some((Expression::Variable(name), 1)))
                }
            }

            Token::LParen(location) => {
                self.descend(location)?;
                let inner = match self.parse_binary(0)? {
                    Some(inner) => inner,
                    None => return Err(self.missing_expression("after '('")),
                };
                self.expect_rparen("after parenthesised expression")?;
                self.ascend();
                Ok(Some(inner))
            }

            token @ (Token::Plus(_) | Token::Minus(_)) => {
                let op = if matches!(token, Token::Plus(_)) {
                    UnaryOp::Identity
                } else {
                    UnaryOp::Negate
                };
                self.descend(token.location())?;
                let (operand, height) = match self.parse_atom()? {
                    Some(operand) => operand,
                    None => {
                        return Err(self.missing_expression(&format!("after unary '{}'", op.symbol())))
                    }
                };
                self.ascend();
                Ok(Some((Expression::unary(op, operand), height + 1)))
            }

            other => {
                self.revert(other);
                Ok(None)
            }
        }
    }

    /// Parse call arguments after the opening parenthesis, through `)`.
    ///
    /// A trailing comma (`F(1,)`) is a syntax error. Older front ends for
    /// this language accepted it; the grammar here requires an expression
    /// after every comma.
    fn parse_arguments(&mut self, callee: &str) -> Result<(Vec<Expression>, usize), ParseError> {
        let mut arguments = Vec::new();
        let mut height = 0;

        if self.match_token(&Token::RParen(DUMMY))? {
            return Ok((arguments, height));
        }

        loop {
            match self.parse_binary(0)? {
                Some((argument, argument_height)) => {
                    height = height.max(argument_height);
                    arguments.push(argument);
                }
                None => {
                    return Err(self.missing_expression(&format!("in arguments of '{}'", callee)))
                }
            }

            if !self.match_token(&Token::Comma(DUMMY))? {
                break;
            }
        }

        self.expect_rparen(&format!("after arguments of '{}'", callee))?;
        Ok((arguments, height))
    }
}

fn too_deep(location: SourceLocation) -> ParseError {
    ParseError::syntax(
        format!("Expression nested too deeply (limit {})", MAX_NESTING),
        location,
    )
}
