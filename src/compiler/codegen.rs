//! Lowering of a verified program to stack-machine instructions
//!
//! Each function is emitted by its own [`FunctionBuilder`] straight into the
//! shared instruction stream, so every address it records is absolute.
//! Forward jumps are emitted with a placeholder target and registered on a
//! [`Label`]; placing the label patches them all.
//!
//! # Short-circuit lowering
//!
//! ```text
//! a && b:  a; jz F; b; push 0; ne; jmp E; F: push 0; E:
//! a || b:  a; jnz T; b; push 0; ne; jmp E; T: push 1; E:
//! ```
//!
//! The right operand is normalised to 0/1 so both operators always yield a
//! boolean.

use crate::compiler::environment::Environment;
use crate::compiler::errors::CompileError;
use crate::compiler::instruction::{
    Address, CompiledProgram, FunctionEntry, GlobalId, Instruction,
};
use crate::compiler::verifier::SignatureTable;
use crate::parser::ast::*;

/// Emit code for every function of an already verified program
pub(crate) fn generate(
    program: &Program,
    signatures: &SignatureTable,
    env: &Environment,
) -> Result<CompiledProgram, CompileError> {
    let mut output = CompiledProgram::default();

    for function in &program.functions {
        let address = output.code.len();
        FunctionBuilder {
            function,
            signatures,
            env,
            code: &mut output.code,
        }
        .build()?;

        output.entries.push(FunctionEntry {
            name: function.name.clone(),
            parameter_count: function.parameters.len(),
            local_count: function.locals.len(),
            produces_value: function.produces_value,
            address,
        });
    }

    Ok(output)
}

/// Storage a variable name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Arg(usize),
    Local(usize),
    Global(GlobalId),
}

/// Pending forward jump target
#[derive(Debug, Default)]
struct Label {
    sites: Vec<Address>,
}

struct FunctionBuilder<'a> {
    function: &'a FunctionDeclaration,
    signatures: &'a SignatureTable,
    env: &'a Environment,
    code: &'a mut Vec<Instruction>,
}

impl FunctionBuilder<'_> {
    fn build(mut self) -> Result<(), CompileError> {
        let function = self.function;
        self.block(&function.body)?;

        // Fallback terminator, emitted even when the body always returns
        // through an if/else
        if !matches!(function.body.last(), Some(Statement::Return(_))) {
            if function.produces_value {
                self.emit(Instruction::Push(0));
                self.emit(Instruction::ReturnValue);
            } else {
                self.emit(Instruction::Return);
            }
        }

        Ok(())
    }

    // ---- emission helpers ----

    fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    /// Emit a jump built by `make` whose target is patched when `label` is placed
    fn jump(&mut self, make: fn(Address) -> Instruction, label: &mut Label) {
        label.sites.push(self.code.len());
        self.emit(make(0));
    }

    /// Bind `label` to the current address
    fn place(&mut self, label: Label) {
        let target = self.code.len();
        for site in label.sites {
            if let Some(slot) = self.code[site].jump_target_mut() {
                *slot = target;
            }
        }
    }

    fn error_unresolved(&self, name: &str) -> CompileError {
        CompileError::UnresolvedSymbol {
            function: self.function.name.clone(),
            name: name.to_string(),
        }
    }

    fn resolve(&self, name: &str) -> Result<Slot, CompileError> {
        if let Some(i) = self.function.parameter_index(name) {
            return Ok(Slot::Arg(i));
        }
        if let Some(i) = self.function.local_index(name) {
            return Ok(Slot::Local(i));
        }
        self.env
            .resolve_global(name)
            .map(Slot::Global)
            .ok_or_else(|| self.error_unresolved(name))
    }

    // ---- statements ----

    fn block(&mut self, block: &Block) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.statement(statement)?;
        }
        Ok(())
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(Expression::Call { name, arguments }) => {
                if self.call(name, arguments)? {
                    self.emit(Instruction::Pop);
                }
            }
            Statement::Expression(expr) => {
                self.value(expr)?;
                self.emit(Instruction::Pop);
            }

            Statement::Set { target, value } => {
                self.value(value)?;
                let store = match self.resolve(target)? {
                    Slot::Arg(i) => Instruction::StoreArg(i),
                    Slot::Local(i) => Instruction::StoreLocal(i),
                    Slot::Global(id) => Instruction::StoreGlobal(id),
                };
                self.emit(store);
            }

            Statement::Return(None) => self.emit(Instruction::Return),
            Statement::Return(Some(expr)) => {
                self.value(expr)?;
                self.emit(Instruction::ReturnValue);
            }

            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.value(condition)?;

                let mut end = Label::default();
                match else_block {
                    Some(else_block) => {
                        let mut otherwise = Label::default();
                        self.jump(Instruction::JumpIfZero, &mut otherwise);
                        self.block(then_block)?;
                        self.jump(Instruction::Jump, &mut end);
                        self.place(otherwise);
                        self.block(else_block)?;
                    }
                    None => {
                        self.jump(Instruction::JumpIfZero, &mut end);
                        self.block(then_block)?;
                    }
                }
                self.place(end);
            }
        }
        Ok(())
    }

    // ---- expressions ----

    /// Emit an expression that must leave exactly one value on the stack
    fn value(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::Number(n) => self.emit(Instruction::Push(*n)),

            Expression::Variable(name) => {
                let load = match self.resolve(name)? {
                    Slot::Arg(i) => Instruction::LoadArg(i),
                    Slot::Local(i) => Instruction::LoadLocal(i),
                    Slot::Global(id) => Instruction::LoadGlobal(id),
                };
                self.emit(load);
            }

            Expression::Unary { op, operand } => {
                self.value(operand)?;
                if *op == UnaryOp::Negate {
                    self.emit(Instruction::Neg);
                }
            }

            Expression::Binary { op, left, right } => {
                let instruction = match op {
                    BinaryOp::And | BinaryOp::Or => return self.short_circuit(*op, left, right),
                    BinaryOp::Add => Instruction::Add,
                    BinaryOp::Sub => Instruction::Sub,
                    BinaryOp::Mul => Instruction::Mul,
                    BinaryOp::Div => Instruction::Div,
                    BinaryOp::Less => Instruction::Less,
                    BinaryOp::Greater => Instruction::Greater,
                    BinaryOp::Equal => Instruction::Equal,
                    BinaryOp::NotEqual => Instruction::NotEqual,
                };
                self.value(left)?;
                self.value(right)?;
                self.emit(instruction);
            }

            Expression::Call { name, arguments } => {
                if !self.call(name, arguments)? {
                    return Err(CompileError::VoidValueMisuse {
                        function: self.function.name.clone(),
                        callee: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn short_circuit(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
    ) -> Result<(), CompileError> {
        let mut decided = Label::default();
        let mut end = Label::default();
        let (test, decided_value): (fn(Address) -> Instruction, i64) = match op {
            BinaryOp::Or => (Instruction::JumpIfNonZero, 1),
            _ => (Instruction::JumpIfZero, 0),
        };

        self.value(left)?;
        self.jump(test, &mut decided);
        self.value(right)?;
        self.emit(Instruction::Push(0));
        self.emit(Instruction::NotEqual);
        self.jump(Instruction::Jump, &mut end);
        self.place(decided);
        self.emit(Instruction::Push(decided_value));
        self.place(end);
        Ok(())
    }

    /// Emit a call and report whether it leaves a value on the stack
    fn call(&mut self, name: &str, arguments: &[Expression]) -> Result<bool, CompileError> {
        for argument in arguments {
            self.value(argument)?;
        }
        let argc = arguments.len();

        if let Some(&signature) = self.signatures.get(name) {
            if signature.arity != argc {
                return Err(CompileError::ArityMismatch {
                    function: self.function.name.clone(),
                    callee: name.to_string(),
                    expected: signature.arity,
                    found: argc,
                });
            }
            self.emit(Instruction::Call {
                function: signature.id,
                argc,
            });
            return Ok(signature.kind.produces_value());
        }

        let Some((id, external)) = self.env.resolve_function(name, argc) else {
            return Err(self.error_unresolved(name));
        };
        let produces_value = external.kind.produces_value();
        self.emit(Instruction::CallExternal {
            function: id,
            argc,
            produces_value,
        });
        Ok(produces_value)
    }
}
