use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::bytecode::{check_fields, Immediate, Slot};
use crate::error::{AssemblyErrorKind, OperandError};

/**
  Opcodes of the virtual machine, the instruction catalog.

  The discriminant of each variant is its opcode, the top byte of the machine word. The
  strum derives give the mnemonic in both directions, so the catalog lookup is
  `Operation::from_str`. `GREATER` is also spelled `>`.

  There are two families of instructions. The stack family (`LOAD_CONSTANT`, `LOAD_MEMORY`,
  `STORE_TO_MEMORY`, `GREATER`) works on the operand stack. The register family (`LOAD`,
  `STORE`, `ADD`, `SUB`, `JUMP`, `HALT`) works on the accumulator and never touches the stack.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,            Hash
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Operation {
  // Register family //
  Load         =  1,  // load( address )
  Store        =  2,  // store( address )
  Add          =  3,  // add( address )
  Sub          =  4,  // sub( address )
  Jump         =  5,  // jump( address )
  Halt         =  6,  // halt

  // Stack family //
  LoadMemory    = 13, // load_memory( slot )
  StoreToMemory = 14, // store_to_memory( slot, address )
  #[strum(to_string = "GREATER", serialize = ">")]
  Greater       = 21, // greater
  LoadConstant  = 27, // load_constant( slot, value )
}

/**
  The encoding shape of an operation: which fields of the machine word it uses. Bits not
  used by a shape are zero.
*/
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum Shape {
  /// [OpCode:8][Reserved:24]
  Nullary,
  /// [OpCode:8][Slot:5][Reserved:19]
  Slot,
  /// [OpCode:8][Slot:5][Immediate:19]
  SlotImmediate,
  /// [OpCode:8][Slot:2][Address:22]
  SlotWideAddress,
  /// [OpCode:8][Reserved:5][Address:19]
  Address,
}

impl Shape {
  /// The number of operands written in assembly for this shape.
  pub fn arity(&self) -> usize {
    match self {
      Shape::Nullary                     => 0,
      Shape::Slot | Shape::Address       => 1,
      Shape::SlotImmediate
      | Shape::SlotWideAddress           => 2,
    }
  }

  pub fn has_slot(&self) -> bool {
    matches!(self, Shape::Slot | Shape::SlotImmediate | Shape::SlotWideAddress)
  }

  pub fn has_immediate(&self) -> bool {
    matches!(self, Shape::SlotImmediate | Shape::SlotWideAddress | Shape::Address)
  }

  /// Why the slot field of this shape is narrower than usual, for diagnostics.
  pub fn slot_note(&self) -> &'static str {
    match self {
      Shape::SlotWideAddress => "; the 22-bit address leaves only 2 bits for the slot",
      _                      => ""
    }
  }
}

impl Operation {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Catalog lookup by mnemonic.
  pub fn from_mnemonic(mnemonic: &str) -> Result<Operation, AssemblyErrorKind> {
    Operation::from_str(mnemonic)
      .map_err(|_| AssemblyErrorKind::UnknownInstruction(mnemonic.to_string()))
  }

  pub fn shape(&self) -> Shape {
    match self {
      | Operation::Load
      | Operation::Store
      | Operation::Add
      | Operation::Sub
      | Operation::Jump          => Shape::Address,

      | Operation::Halt
      | Operation::Greater       => Shape::Nullary,

      Operation::LoadMemory      => Shape::Slot,
      Operation::StoreToMemory   => Shape::SlotWideAddress,
      Operation::LoadConstant    => Shape::SlotImmediate,
    }
  }

  pub fn arity(&self) -> usize {
    self.shape().arity()
  }
}

/**
  A decoded instruction. There is one variant per operation, each carrying exactly the
  operands its shape encodes, so dispatch is an exhaustive `match`.

  Values held here are not range checked on construction; `encode_instruction` and
  `Instruction::from_operands` do the checking.
*/
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Instruction {
  Load(Immediate),
  Store(Immediate),
  Add(Immediate),
  Sub(Immediate),
  Jump(Immediate),
  Halt,
  LoadMemory {
    slot : Slot
  },
  StoreToMemory {
    slot    : Slot,
    address : Immediate
  },
  Greater,
  LoadConstant {
    slot  : Slot,
    value : Immediate
  },
}

impl Instruction {
  pub fn operation(&self) -> Operation {
    match self {
      Instruction::Load(_)               => Operation::Load,
      Instruction::Store(_)              => Operation::Store,
      Instruction::Add(_)                => Operation::Add,
      Instruction::Sub(_)                => Operation::Sub,
      Instruction::Jump(_)               => Operation::Jump,
      Instruction::Halt                  => Operation::Halt,
      Instruction::LoadMemory { .. }     => Operation::LoadMemory,
      Instruction::StoreToMemory { .. }  => Operation::StoreToMemory,
      Instruction::Greater               => Operation::Greater,
      Instruction::LoadConstant { .. }   => Operation::LoadConstant,
    }
  }

  /// The raw (slot, immediate) field values. Fields the shape does not use are zero.
  pub fn fields(&self) -> (Slot, Immediate) {
    match *self {
      | Instruction::Load(address)
      | Instruction::Store(address)
      | Instruction::Add(address)
      | Instruction::Sub(address)
      | Instruction::Jump(address)                  => (0, address),

      | Instruction::Halt
      | Instruction::Greater                        => (0, 0),

      Instruction::LoadMemory { slot }              => (slot, 0),
      Instruction::StoreToMemory { slot, address }  => (slot, address),
      Instruction::LoadConstant { slot, value }     => (slot, value),
    }
  }

  /// Builds the instruction for `operation` from already-validated field values.
  pub fn from_fields(operation: Operation, slot: Slot, immediate: Immediate) -> Instruction {
    match operation {
      Operation::Load          => Instruction::Load(immediate),
      Operation::Store         => Instruction::Store(immediate),
      Operation::Add           => Instruction::Add(immediate),
      Operation::Sub           => Instruction::Sub(immediate),
      Operation::Jump          => Instruction::Jump(immediate),
      Operation::Halt          => Instruction::Halt,
      Operation::LoadMemory    => Instruction::LoadMemory { slot },
      Operation::StoreToMemory => Instruction::StoreToMemory { slot, address: immediate },
      Operation::Greater       => Instruction::Greater,
      Operation::LoadConstant  => Instruction::LoadConstant { slot, value: immediate },
    }
  }

  /**
    Builds the instruction for `operation` from the operands as written in assembly, checking
    the operand count and that every operand fits its field.
  */
  pub fn from_operands(operation: Operation, operands: &[i64]) -> Result<Instruction, OperandError> {
    let shape = operation.shape();
    if operands.len() != shape.arity() {
      return Err(OperandError::WrongArity {
        operation,
        expected: shape.arity(),
        found: operands.len()
      });
    }

    let (slot, immediate) =
      match shape {
        Shape::Nullary         => (0, 0),
        Shape::Slot            => (operands[0], 0),
        Shape::Address         => (0, operands[0]),
        Shape::SlotImmediate
        | Shape::SlotWideAddress => (operands[0], operands[1]),
      };

    let (slot, immediate) = check_fields(operation, slot, immediate)?;
    Ok(Instruction::from_fields(operation, slot, immediate))
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let operation = self.operation();
    let (slot, immediate) = self.fields();

    match operation.shape() {
      Shape::Nullary         => write!(f, "{}", operation),
      Shape::Slot            => write!(f, "{} {}", operation, slot),
      Shape::Address         => write!(f, "{} {}", operation, immediate),
      Shape::SlotImmediate
      | Shape::SlotWideAddress => write!(f, "{} {} {}", operation, slot, immediate),
    }
  }
}
