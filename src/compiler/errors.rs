//! Compile error types
//!
//! This module defines [`CompileError`], which represents every semantic
//! failure found after parsing succeeded: verifier failures and symbol
//! resolution failures during code generation.
//!
//! All compile errors are fatal. No partial output is produced.

use thiserror::Error;

/// Semantic errors raised by the verifier and code generator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A second declaration reused an already registered function name
    #[error("Function '{function}' is already defined")]
    FunctionRedefinition { function: String },

    /// A parameter or local name appears more than once in one function
    #[error("Name '{name}' is declared more than once in '{function}'")]
    DuplicateName { function: String, name: String },

    /// `return;` in a `func`, or `return expr;` in a `proc`
    #[error("{}", return_kind_message(.function, .expected_value))]
    ReturnKindMismatch {
        function: String,
        expected_value: bool,
    },

    /// A statement follows one that always returns
    #[error("Unreachable code in '{function}'")]
    UnreachableCode { function: String },

    /// A value-returning function can reach its end without returning
    #[error("Not all code paths return a value in '{function}'")]
    IncompleteReturnPaths { function: String },

    /// A void call was used where a value is required
    #[error("Call to '{callee}' produces no value but one is required in '{function}'")]
    VoidValueMisuse { function: String, callee: String },

    /// A name matched no parameter, local, global or function
    #[error("Unresolved symbol '{name}' in '{function}'")]
    UnresolvedSymbol { function: String, name: String },

    /// A call to a program function with the wrong number of arguments
    #[error("'{callee}' expects {expected} argument(s) but {found} were given in '{function}'")]
    ArityMismatch {
        function: String,
        callee: String,
        expected: usize,
        found: usize,
    },
}

fn return_kind_message(function: &str, expected_value: &bool) -> String {
    if *expected_value {
        format!("Function '{}' must return a value", function)
    } else {
        format!("Procedure '{}' cannot return a value", function)
    }
}

impl CompileError {
    /// Name of the function the error occurred in
    pub fn function(&self) -> &str {
        match self {
            CompileError::FunctionRedefinition { function }
            | CompileError::DuplicateName { function, .. }
            | CompileError::ReturnKindMismatch { function, .. }
            | CompileError::UnreachableCode { function }
            | CompileError::IncompleteReturnPaths { function }
            | CompileError::VoidValueMisuse { function, .. }
            | CompileError::UnresolvedSymbol { function, .. }
            | CompileError::ArityMismatch { function, .. } => function,
        }
    }
}
