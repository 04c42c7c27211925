//! Error types for assembling, loading and executing programs.

use std::path::PathBuf;

use thiserror::Error;

use crate::bytecode::Operation;
use crate::state::Value;

/// A problem with the operands of a single instruction. Raised by the assembler and by
/// `encode_instruction`, always before any bits are packed.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum OperandError {
  #[error("{operation} takes {expected} operand(s) but was given {found}")]
  WrongArity {
    operation : Operation,
    expected  : usize,
    found     : usize
  },

  #[error("`{0}` is not a base-10 integer")]
  NotANumber(String),

  #[error(
    "{operation}: slot {slot} does not fit the slot field (must be below {limit}{})",
    .operation.shape().slot_note()
  )]
  SlotOutOfRange {
    operation : Operation,
    slot      : i64,
    limit     : u32
  },

  #[error("{operation}: value {value} does not fit the immediate field (must be below {limit})")]
  ValueOutOfRange {
    operation : Operation,
    value     : i64,
    limit     : u32
  },
}

/// A word whose top byte is not in the catalog.
#[derive(Error, Clone, Copy, Debug, Eq, PartialEq)]
#[error("unknown opcode {0:#04X}")]
pub struct UnknownOpcode(pub u8);

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum AssemblyErrorKind {
  #[error("unknown instruction `{0}`")]
  UnknownInstruction(String),

  #[error("invalid operand: {0}")]
  InvalidOperand(#[from] OperandError),

  #[error("could not parse `{0}`")]
  Syntax(String),
}

/// The first invalid line of an assembly source. Line numbers count from 1.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
#[error("line {line}: {kind}")]
pub struct AssemblyError {
  pub line : usize,
  pub kind : AssemblyErrorKind
}

/// Trailing bytes at the end of a binary that do not make up a whole word. This is a
/// diagnostic, not a failure: the partial word is dropped and never executed.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
#[error("binary truncated: {} trailing byte(s) at offset {offset} do not form a whole word", .trailing.len())]
pub struct TruncatedBinary {
  pub offset   : usize,
  pub trailing : Vec<u8>
}

/// Fatal conditions raised while the machine executes. Each carries the program counter of
/// the instruction that failed.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ExecutionError {
  #[error("unknown opcode {opcode:#04X} at pc {pc}")]
  UnknownOpcode {
    pc     : usize,
    opcode : u8
  },

  #[error("{operation} at pc {pc} needs {required} stack value(s) but the stack holds {available}")]
  StackUnderflow {
    pc        : usize,
    operation : Operation,
    required  : usize,
    available : usize
  },

  #[error("{operation} at pc {pc} overflowed the operand stack (capacity {capacity})")]
  StackOverflow {
    pc        : usize,
    operation : Operation,
    capacity  : usize
  },

  #[error("{operation} at pc {pc}: address {address} is outside memory of size {size}")]
  InvalidAddress {
    pc        : usize,
    operation : Operation,
    address   : Value,
    size      : usize
  },

  #[error("{operation} at pc {pc} overflowed the accumulator")]
  ArithmeticOverflow {
    pc        : usize,
    operation : Operation
  },
}

impl ExecutionError {
  pub fn pc(&self) -> usize {
    match self {
      | ExecutionError::UnknownOpcode      { pc, .. }
      | ExecutionError::StackUnderflow     { pc, .. }
      | ExecutionError::StackOverflow      { pc, .. }
      | ExecutionError::InvalidAddress     { pc, .. }
      | ExecutionError::ArithmeticOverflow { pc, .. } => *pc
    }
  }
}

/// Crate level error used by the file-facing operations and the command line driver.
#[derive(Error, Debug)]
pub enum Error {
  #[error(transparent)]
  Assembly(#[from] AssemblyError),

  #[error(transparent)]
  Execution(#[from] ExecutionError),

  #[error("invalid memory range [{start}, {end}] for memory of size {size}")]
  InvalidDumpRange {
    start : usize,
    end   : usize,
    size  : usize
  },

  #[error("{}: {source}", .path.display())]
  Io {
    path   : PathBuf,
    source : std::io::Error
  },

  #[error("could not serialize log: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
