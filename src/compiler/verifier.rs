//! Whole-program semantic verification
//!
//! Runs before code generation and produces the [`SignatureTable`] the code
//! generator resolves calls against. Because every signature is registered
//! here first, a function may call any other regardless of declaration
//! order, mutual recursion included.
//!
//! # Checks
//!
//! For each function, in declaration order:
//!
//! 1. Its name is not already registered ([`CompileError::FunctionRedefinition`])
//! 2. No parameter or local name repeats ([`CompileError::DuplicateName`])
//! 3. Each `return` carries a value exactly when the function is a `func`
//!    ([`CompileError::ReturnKindMismatch`])
//! 4. Nothing follows a statement that always returns ([`CompileError::UnreachableCode`])
//! 5. A `func` returns on every path ([`CompileError::IncompleteReturnPaths`])
//!
//! # Definiteness
//!
//! A statement is *definite* when every path through it ends in a return.
//! `return` is definite. `if` is definite only with an `else` whose both
//! branches are definite. A block is definite when one of its statements is.

use crate::compiler::errors::CompileError;
use crate::compiler::instruction::FunctionId;
use crate::parser::ast::{Block, FunctionDeclaration, FunctionKind, Program, Statement};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};

/// Compile-time description of a program function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub id: FunctionId,
    pub arity: usize,
    pub kind: FunctionKind,
}

/// Name → signature map, in declaration order
#[derive(Debug, Clone, Default)]
pub struct SignatureTable {
    signatures: IndexMap<String, Signature, FxBuildHasher>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function under the next [`FunctionId`]
    pub fn register(&mut self, function: &FunctionDeclaration) -> Result<Signature, CompileError> {
        if self.signatures.contains_key(&function.name) {
            return Err(CompileError::FunctionRedefinition {
                function: function.name.clone(),
            });
        }

        let signature = Signature {
            id: FunctionId(self.signatures.len()),
            arity: function.parameters.len(),
            kind: function.kind(),
        };
        self.signatures.insert(function.name.clone(), signature);
        Ok(signature)
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Signature)> {
        self.signatures.iter().map(|(name, sig)| (name.as_str(), sig))
    }
}

/// Verify every function and return the completed signature table
pub fn verify(program: &Program) -> Result<SignatureTable, CompileError> {
    let mut table = SignatureTable::new();

    for function in &program.functions {
        table.register(function)?;
        check_names(function)?;

        let definite = FunctionVerifier { function }.block(&function.body)?;
        if function.produces_value && !definite {
            return Err(CompileError::IncompleteReturnPaths {
                function: function.name.clone(),
            });
        }
    }

    Ok(table)
}

fn check_names(function: &FunctionDeclaration) -> Result<(), CompileError> {
    let mut seen = FxHashSet::default();
    for name in function.parameters.iter().chain(&function.locals) {
        if !seen.insert(name.as_str()) {
            return Err(CompileError::DuplicateName {
                function: function.name.clone(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

struct FunctionVerifier<'a> {
    function: &'a FunctionDeclaration,
}

impl FunctionVerifier<'_> {
    /// Returns whether the block is definite
    fn block(&self, block: &Block) -> Result<bool, CompileError> {
        let mut definite = false;

        for statement in &block.statements {
            if definite {
                return Err(CompileError::UnreachableCode {
                    function: self.function.name.clone(),
                });
            }
            definite = self.statement(statement)?;
        }

        Ok(definite)
    }

    fn statement(&self, statement: &Statement) -> Result<bool, CompileError> {
        match statement {
            Statement::Return(value) => {
                if value.is_some() != self.function.produces_value {
                    return Err(CompileError::ReturnKindMismatch {
                        function: self.function.name.clone(),
                        expected_value: self.function.produces_value,
                    });
                }
                Ok(true)
            }
            Statement::If {
                then_block,
                else_block,
                ..
            } => {
                let then_definite = self.block(then_block)?;
                let else_definite = match else_block {
                    Some(else_block) => self.block(else_block)?,
                    None => false,
                };
                Ok(then_definite && else_definite)
            }
            Statement::Expression(_) | Statement::Set { .. } => Ok(false),
        }
    }
}
