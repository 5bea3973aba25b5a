//! Compiler from AST to stack-machine code
//!
//! This module turns a parsed [`Program`] into a [`CompiledProgram`]:
//! - [`verifier`]: Signature registration and return/reachability checks
//! - `codegen`: Lowering to instructions
//! - [`environment`]: External functions and globals supplied by the host
//! - [`instruction`]: Instruction set, function entries and disassembly
//! - [`errors`]: Compile error types
//!
//! # Pipeline
//!
//! Compilation is two whole-program passes. The verifier runs to completion
//! first, so code generation sees every signature and calls may refer to
//! functions declared later in the source.
//!
//! ```text
//! Program → verify → SignatureTable → codegen → CompiledProgram
//! ```

mod codegen;
pub mod environment;
pub mod errors;
pub mod instruction;
pub mod verifier;

use crate::parser::ast::Program;
use environment::Environment;
use errors::CompileError;
use instruction::CompiledProgram;

/// Compiles programs against a fixed external environment.
///
/// A `Compiler` holds no per-compilation state; every call to
/// [`compile`](Compiler::compile) works on its own context, so one instance
/// may be reused freely.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'env> {
    env: &'env Environment,
}

impl<'env> Compiler<'env> {
    pub fn new(env: &'env Environment) -> Self {
        Self { env }
    }

    /// Verify and lower a whole program
    pub fn compile(&self, program: &Program) -> Result<CompiledProgram, CompileError> {
        let signatures = verifier::verify(program)?;
        codegen::generate(program, &signatures, self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::FunctionKind;
    use crate::parser::parse::Parser;

    #[test]
    fn test_compile_is_repeatable() {
        let mut env = Environment::new();
        env.function("Print", 1, FunctionKind::Void);
        let compiler = Compiler::new(&env);

        let program = Parser::new("proc Main(a) { if (a > 0 && a < 10) { Print(a); } }")
            .parse_program()
            .unwrap();

        let first = compiler.compile(&program).unwrap();
        let second = compiler.compile(&program).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn test_verifier_runs_before_codegen() {
        // Unresolved `x` would fail codegen, but the redefinition is found first
        let env = Environment::new();
        let program = Parser::new("proc A() { x = 1; } proc A() { }")
            .parse_program()
            .unwrap();

        assert!(matches!(
            Compiler::new(&env).compile(&program),
            Err(CompileError::FunctionRedefinition { .. })
        ));
    }
}
