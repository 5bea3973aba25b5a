//! Stack-machine instruction set and compiled program container
//!
//! A [`CompiledProgram`] is one flat instruction stream shared by every
//! function, plus a [`FunctionEntry`] table describing where each function
//! starts and how large its frame is. Jump targets are absolute addresses
//! into that stream.
//!
//! # Stack discipline
//!
//! Every instruction pops its operands from the operand stack and pushes at
//! most one result. Comparisons push `1` or `0`. A call pops `argc` values,
//! the last argument on top, and pushes the callee's result only when the
//! callee produces a value.

use std::fmt;

/// Index of a program function in [`CompiledProgram::entries`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

/// Id handed out by [`Environment::function`](crate::compiler::environment::Environment::function)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExternalId(pub usize);

/// Id handed out by [`Environment::global`](crate::compiler::environment::Environment::global)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub usize);

/// Absolute position in the instruction stream
pub type Address = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // Constants
    Push(i64),
    Pop,

    // Slots
    LoadArg(usize),
    StoreArg(usize),
    LoadLocal(usize),
    StoreLocal(usize),
    LoadGlobal(GlobalId),
    StoreGlobal(GlobalId),

    // Arithmetic
    Neg,
    Add,
    Sub,
    Mul,
    Div,

    // Relational
    Less,
    Greater,
    Equal,
    NotEqual,

    // Control flow
    Jump(Address),
    JumpIfZero(Address),
    JumpIfNonZero(Address),

    Call {
        function: FunctionId,
        argc: usize,
    },
    CallExternal {
        function: ExternalId,
        argc: usize,
        produces_value: bool,
    },
    Return,
    ReturnValue,
}

impl Instruction {
    /// Jump target, if this instruction transfers control within the stream
    pub fn jump_target_mut(&mut self) -> Option<&mut Address> {
        match self {
            Instruction::Jump(target)
            | Instruction::JumpIfZero(target)
            | Instruction::JumpIfNonZero(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(value) => write!(f, "push {}", value),
            Instruction::Pop => write!(f, "pop"),
            Instruction::LoadArg(i) => write!(f, "ldarg {}", i),
            Instruction::StoreArg(i) => write!(f, "starg {}", i),
            Instruction::LoadLocal(i) => write!(f, "ldloc {}", i),
            Instruction::StoreLocal(i) => write!(f, "stloc {}", i),
            Instruction::LoadGlobal(id) => write!(f, "ldglob {}", id.0),
            Instruction::StoreGlobal(id) => write!(f, "stglob {}", id.0),
            Instruction::Neg => write!(f, "neg"),
            Instruction::Add => write!(f, "add"),
            Instruction::Sub => write!(f, "sub"),
            Instruction::Mul => write!(f, "mul"),
            Instruction::Div => write!(f, "div"),
            Instruction::Less => write!(f, "lt"),
            Instruction::Greater => write!(f, "gt"),
            Instruction::Equal => write!(f, "eq"),
            Instruction::NotEqual => write!(f, "ne"),
            Instruction::Jump(target) => write!(f, "jmp {:04}", target),
            Instruction::JumpIfZero(target) => write!(f, "jz {:04}", target),
            Instruction::JumpIfNonZero(target) => write!(f, "jnz {:04}", target),
            Instruction::Call { function, argc } => write!(f, "call #{} {}", function.0, argc),
            Instruction::CallExternal {
                function,
                argc,
                produces_value,
            } => write!(
                f,
                "callext #{} {}{}",
                function.0,
                argc,
                if *produces_value { "" } else { " void" }
            ),
            Instruction::Return => write!(f, "ret"),
            Instruction::ReturnValue => write!(f, "retval"),
        }
    }
}

/// Frame layout and start address of one compiled function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: String,
    pub parameter_count: usize,
    pub local_count: usize,
    pub produces_value: bool,
    pub address: Address,
}

/// Output of a successful compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledProgram {
    pub code: Vec<Instruction>,
    /// Indexed by [`FunctionId`], in declaration order
    pub entries: Vec<FunctionEntry>,
}

impl CompiledProgram {
    pub fn entry(&self, id: FunctionId) -> Option<&FunctionEntry> {
        self.entries.get(id.0)
    }

    /// Look up a function by name
    pub fn find(&self, name: &str) -> Option<(FunctionId, &FunctionEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.name == name)
            .map(|(i, entry)| (FunctionId(i), entry))
    }

    /// Instructions belonging to one function: from its address up to the
    /// next entry's address or the end of the stream
    pub fn function_code(&self, id: FunctionId) -> Option<&[Instruction]> {
        let entry = self.entries.get(id.0)?;
        let end = self
            .entries
            .get(id.0 + 1)
            .map_or(self.code.len(), |next| next.address);
        self.code.get(entry.address..end)
    }
}

impl fmt::Display for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(
                f,
                "#{} {} {}(args={}, locals={}):",
                i,
                if entry.produces_value { "func" } else { "proc" },
                entry.name,
                entry.parameter_count,
                entry.local_count
            )?;
            for (offset, instruction) in self
                .function_code(FunctionId(i))
                .unwrap_or_default()
                .iter()
                .enumerate()
            {
                writeln!(f, "  {:04}  {}", entry.address + offset, instruction)?;
            }
        }
        Ok(())
    }
}
