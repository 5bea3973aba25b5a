//! Stack-language source parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens, with pushback)
//! - [`parse`]: Parser entry point and helpers (tokens → AST)
//! - [`ast`]: AST node definitions
//! - [`printer`]: AST → source text
//!
//! # Language
//!
//! A program is a sequence of `func` (value-returning) and `proc` (void)
//! declarations. Statements are assignments, `if`/`else`, `return` and
//! expression statements. The only value type is a 64-bit signed integer.
//!
//! ```text
//! func Get1() {
//!     return 1;
//! }
//! proc Main(a, b) {
//!     var m;
//!     m = a + b * Get1();
//!     if (m > 3 && a != 0) { Print(m); }
//! }
//! ```
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod printer;
mod statements;
