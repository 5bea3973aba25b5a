//! # Introduction
//!
//! stackc compiles a small imperative language with a single 64-bit integer
//! type into instructions for an abstract stack machine, and ships a
//! reference machine to run them.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser → AST → Verifier → Code generator → CompiledProgram → Machine
//! ```
//!
//! 1. [`parser`] tokenises the source and builds an AST. Tokens are read
//!    lazily and may be pushed back, which lets the parser try a statement
//!    form and back out.
//! 2. [`compiler`] verifies the whole program (signatures, return paths,
//!    unreachable code) and then lowers it. External functions and globals
//!    come from a host-supplied [`compiler::environment::Environment`].
//! 3. [`vm`] executes the instruction stream. Externals and globals are
//!    served by a [`vm::Host`], usually [`vm::Bindings`].
//!
//! ## Example
//!
//! ```
//! use stackc::compiler::environment::Environment;
//! use stackc::parser::ast::FunctionKind;
//! use stackc::vm::{Bindings, Machine, MachineConfig};
//!
//! let mut env = Environment::new();
//! env.function("Print", 1, FunctionKind::Void);
//!
//! let program = stackc::compile("proc Main(a) { Print(a * 2); }", &env).unwrap();
//!
//! let mut out = Vec::new();
//! let mut bindings = Bindings::new(&env);
//! bindings.bind("Print", |args| { out.push(args[0]); 0 }).unwrap();
//! Machine::new(&program, bindings, MachineConfig::default())
//!     .invoke("Main", &[21])
//!     .unwrap();
//! assert_eq!(out, vec![42]);
//! ```

pub mod compiler;
pub mod error;
pub mod parser;
pub mod vm;

pub use error::Error;

use compiler::environment::Environment;
use compiler::instruction::CompiledProgram;
use compiler::Compiler;
use parser::parse::Parser;

/// Parse, verify and lower `source` in one step
pub fn compile(source: &str, env: &Environment) -> Result<CompiledProgram, Error> {
    let program = Parser::new(source).parse_program()?;
    Ok(Compiler::new(env).compile(&program)?)
}
