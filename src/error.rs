//! Crate-level error covering every compilation stage
//!
//! Lexer failures arrive inside [`ParseError`] with
//! [`ParseErrorKind::Lex`](crate::parser::parse::ParseErrorKind::Lex), since
//! the parser pulls tokens on demand.

use crate::compiler::errors::CompileError;
use crate::parser::parse::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
}
