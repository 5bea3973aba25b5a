//! Reference stack machine
//!
//! Executes a [`CompiledProgram`] against a [`Host`]:
//! - [`host`]: The [`Host`] trait and the closure-backed [`Bindings`]
//! - [`errors`]: Runtime error types
//!
//! # Execution Model
//!
//! One operand stack is shared by every frame. A call leaves its arguments
//! where the caller pushed them; the callee's frame records that position as
//! its `base` and addresses arguments relative to it. Locals live in the
//! frame itself and start at 0. Returning truncates the stack back to `base`
//! and pushes the result, if any.
//!
//! Arithmetic wraps on overflow, except division, which reports
//! [`VmError::DivisionByZero`] and [`VmError::Overflow`]. Recursion is bounded
//! by [`MachineConfig::max_call_depth`] rather than by the Rust stack: the
//! dispatch loop never recurses.

pub mod errors;
pub mod host;

pub use errors::VmError;
pub use host::{Bindings, Host};

use crate::compiler::instruction::{Address, CompiledProgram, FunctionEntry, Instruction};

/// Default limit on nested calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    pub max_call_depth: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Activation record
#[derive(Debug, Clone)]
struct Frame {
    /// `None` for the frame `invoke` entered
    return_address: Option<Address>,
    base: usize,
    argc: usize,
    locals: Vec<i64>,
}

impl Frame {
    fn new(entry: &FunctionEntry, return_address: Option<Address>, base: usize) -> Self {
        Self {
            return_address,
            base,
            argc: entry.parameter_count,
            locals: vec![0; entry.local_count],
        }
    }

    /// First operand-stack slot above the arguments
    fn floor(&self) -> usize {
        self.base + self.argc
    }
}

pub struct Machine<'p, H: Host> {
    program: &'p CompiledProgram,
    host: H,
    config: MachineConfig,
    stack: Vec<i64>,
    frames: Vec<Frame>,
}

impl<'p, H: Host> Machine<'p, H> {
    pub fn new(program: &'p CompiledProgram, host: H, config: MachineConfig) -> Self {
        Self {
            program,
            host,
            config,
            stack: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Call a compiled function by name and run it to completion.
    ///
    /// Returns `Some(value)` for a `func`, `None` for a `proc`.
    pub fn invoke(&mut self, name: &str, args: &[i64]) -> Result<Option<i64>, VmError> {
        let (_, entry) = self
            .program
            .find(name)
            .ok_or_else(|| VmError::UnknownEntry(name.to_string()))?;

        if args.len() != entry.parameter_count {
            return Err(VmError::ArgumentCountMismatch {
                name: name.to_string(),
                expected: entry.parameter_count,
                found: args.len(),
            });
        }

        let address = entry.address;
        let frame = Frame::new(entry, None, 0);

        self.stack.clear();
        self.frames.clear();
        self.stack.extend_from_slice(args);
        self.frames.push(frame);

        let result = self.run(address);
        if result.is_err() {
            self.stack.clear();
            self.frames.clear();
        }
        result
    }

    fn run(&mut self, mut pc: Address) -> Result<Option<i64>, VmError> {
        loop {
            let instruction = *self
                .program
                .code
                .get(pc)
                .ok_or(VmError::InvalidAddress { address: pc })?;
            let mut next = pc + 1;

            match instruction {
                Instruction::Push(value) => self.stack.push(value),
                Instruction::Pop => {
                    self.pop(pc)?;
                }

                Instruction::LoadArg(slot) => {
                    let index = self.arg_index(pc, slot)?;
                    let value = self.stack[index];
                    self.stack.push(value);
                }
                Instruction::StoreArg(slot) => {
                    let value = self.pop(pc)?;
                    let index = self.arg_index(pc, slot)?;
                    self.stack[index] = value;
                }
                Instruction::LoadLocal(slot) => {
                    let value = *self.local(pc, slot)?;
                    self.stack.push(value);
                }
                Instruction::StoreLocal(slot) => {
                    let value = self.pop(pc)?;
                    *self.local(pc, slot)? = value;
                }
                Instruction::LoadGlobal(id) => {
                    let value = self.host.load_global(id)?;
                    self.stack.push(value);
                }
                Instruction::StoreGlobal(id) => {
                    let value = self.pop(pc)?;
                    self.host.store_global(id, value)?;
                }

                Instruction::Neg => {
                    let value = self.pop(pc)?;
                    self.stack.push(value.wrapping_neg());
                }
                Instruction::Add => self.binary(pc, |a, b| Ok(a.wrapping_add(b)))?,
                Instruction::Sub => self.binary(pc, |a, b| Ok(a.wrapping_sub(b)))?,
                Instruction::Mul => self.binary(pc, |a, b| Ok(a.wrapping_mul(b)))?,
                Instruction::Div => self.binary(pc, |a, b| {
                    if b == 0 {
                        Err(VmError::DivisionByZero { address: pc })
                    } else {
                        a.checked_div(b).ok_or(VmError::Overflow { address: pc })
                    }
                })?,
                Instruction::Less => self.binary(pc, |a, b| Ok((a < b) as i64))?,
                Instruction::Greater => self.binary(pc, |a, b| Ok((a > b) as i64))?,
                Instruction::Equal => self.binary(pc, |a, b| Ok((a == b) as i64))?,
                Instruction::NotEqual => self.binary(pc, |a, b| Ok((a != b) as i64))?,

                Instruction::Jump(target) => next = target,
                Instruction::JumpIfZero(target) => {
                    if self.pop(pc)? == 0 {
                        next = target;
                    }
                }
                Instruction::JumpIfNonZero(target) => {
                    if self.pop(pc)? != 0 {
                        next = target;
                    }
                }

                Instruction::Call { function, argc } => {
                    if self.frames.len() >= self.config.max_call_depth {
                        return Err(VmError::CallDepthExceeded {
                            limit: self.config.max_call_depth,
                        });
                    }
                    let entry = self
                        .program
                        .entry(function)
                        .ok_or(VmError::InvalidAddress { address: pc })?;
                    if entry.parameter_count != argc {
                        return Err(VmError::ArgumentCountMismatch {
                            name: entry.name.clone(),
                            expected: entry.parameter_count,
                            found: argc,
                        });
                    }
                    let base = self.operands_base(pc, argc)?;
                    self.frames.push(Frame::new(entry, Some(next), base));
                    next = entry.address;
                }
                Instruction::CallExternal {
                    function,
                    argc,
                    produces_value,
                } => {
                    let base = self.operands_base(pc, argc)?;
                    let result = self.host.call_external(function, &self.stack[base..])?;
                    self.stack.truncate(base);
                    if produces_value {
                        self.stack.push(result);
                    }
                }

                Instruction::Return => match self.leave(pc, None)? {
                    Some(return_address) => next = return_address,
                    None => return Ok(None),
                },
                Instruction::ReturnValue => {
                    let value = self.pop(pc)?;
                    match self.leave(pc, Some(value))? {
                        Some(return_address) => next = return_address,
                        None => return Ok(Some(value)),
                    }
                }
            }

            pc = next;
        }
    }

    // ---- frame helpers ----

    fn frame(&self, pc: Address) -> Result<&Frame, VmError> {
        self.frames
            .last()
            .ok_or(VmError::InvalidAddress { address: pc })
    }

    fn pop(&mut self, pc: Address) -> Result<i64, VmError> {
        let floor = self.frame(pc)?.floor();
        if self.stack.len() <= floor {
            return Err(VmError::StackUnderflow { address: pc });
        }
        self.stack.pop().ok_or(VmError::StackUnderflow { address: pc })
    }

    /// Stack index where the top `count` operands start
    fn operands_base(&self, pc: Address, count: usize) -> Result<usize, VmError> {
        let floor = self.frame(pc)?.floor();
        self.stack
            .len()
            .checked_sub(count)
            .filter(|&base| base >= floor)
            .ok_or(VmError::StackUnderflow { address: pc })
    }

    fn binary(
        &mut self,
        pc: Address,
        op: impl FnOnce(i64, i64) -> Result<i64, VmError>,
    ) -> Result<(), VmError> {
        let right = self.pop(pc)?;
        let left = self.pop(pc)?;
        self.stack.push(op(left, right)?);
        Ok(())
    }

    fn arg_index(&self, pc: Address, slot: usize) -> Result<usize, VmError> {
        let frame = self.frame(pc)?;
        if slot >= frame.argc {
            return Err(VmError::InvalidSlot { address: pc, slot });
        }
        Ok(frame.base + slot)
    }

    fn local(&mut self, pc: Address, slot: usize) -> Result<&mut i64, VmError> {
        self.frames
            .last_mut()
            .ok_or(VmError::InvalidAddress { address: pc })?
            .locals
            .get_mut(slot)
            .ok_or(VmError::InvalidSlot { address: pc, slot })
    }

    /// Pop the current frame, push `result` for the caller and return where
    /// to continue. `None` means the entry frame returned.
    fn leave(&mut self, pc: Address, result: Option<i64>) -> Result<Option<Address>, VmError> {
        let frame = self
            .frames
            .pop()
            .ok_or(VmError::InvalidAddress { address: pc })?;
        self.stack.truncate(frame.base);

        if frame.return_address.is_some() {
            if let Some(value) = result {
                self.stack.push(value);
            }
        }
        Ok(frame.return_address)
    }
}
