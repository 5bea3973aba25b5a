//! Runtime error types for the reference machine
//!
//! All runtime errors are fatal: they abandon the current invocation and
//! leave the operand stack and frames cleared for the next one.

use crate::compiler::instruction::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// No compiled function has the requested name
    #[error("No function named '{0}'")]
    UnknownEntry(String),

    /// `invoke` was given the wrong number of arguments
    #[error("'{name}' expects {expected} argument(s) but {found} were given")]
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// An instruction needed more operands than the frame holds
    #[error("Stack underflow at {address:04}")]
    StackUnderflow { address: Address },

    #[error("Division by zero at {address:04}")]
    DivisionByZero { address: Address },

    /// `i64::MIN / -1`
    #[error("Integer overflow at {address:04}")]
    Overflow { address: Address },

    #[error("Call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: usize },

    /// The host has no implementation for a declared external function
    #[error("External function '{0}' is not bound")]
    UnboundExternal(String),

    /// Binding a name the environment never declared
    #[error("External function '{0}' is not declared")]
    UndeclaredExternal(String),

    #[error("Global '{0}' is not declared")]
    UnboundGlobal(String),

    /// Jump, call or fall-through outside the instruction stream
    #[error("Invalid code address {address:04}")]
    InvalidAddress { address: Address },

    /// Argument or local index outside the current frame
    #[error("Invalid frame slot {slot} at {address:04}")]
    InvalidSlot { address: Address, slot: usize },
}
