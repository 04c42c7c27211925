/*!
  This module is responsible for the encoding and decoding of binary instructions.

*/
use std::convert::TryFrom;

use super::{Instruction, Operation, Shape};
use crate::error::{OperandError, TruncatedBinary, UnknownOpcode};

// If you change this you must also change `encode_instruction` and `decode_word`.
pub type Word = u32;
pub type Slot = u8;
pub type Immediate = u32;

pub const WORD_BYTES: usize = 4;

pub const OPCODE_SHIFT : u32 = 24;
pub const SLOT_SHIFT   : u32 = 19;
pub const SLOT_BITS    : u32 = 5;
pub const IMMEDIATE_BITS : u32 = 19;

// `STORE_TO_MEMORY` trades three slot bits for a wider address.
pub const WIDE_SLOT_SHIFT : u32 = 22;
pub const WIDE_SLOT_BITS  : u32 = 2;
pub const WIDE_ADDRESS_BITS : u32 = 22;

/// Exclusive upper bound of the slot field for the given shape.
pub fn slot_limit(shape: Shape) -> u32 {
  match shape {
    Shape::SlotWideAddress => 1 << WIDE_SLOT_BITS,
    _                      => 1 << SLOT_BITS
  }
}

/// Exclusive upper bound of the immediate field for the given shape.
pub fn immediate_limit(shape: Shape) -> u32 {
  match shape {
    Shape::SlotWideAddress => 1 << WIDE_ADDRESS_BITS,
    _                      => 1 << IMMEDIATE_BITS
  }
}

/**
  Checks that `slot` and `immediate` fit the fields `operation` encodes, returning them
  narrowed to their field types. Fields the shape does not use must be zero.
*/
pub fn check_fields(operation: Operation, slot: i64, immediate: i64)
  -> Result<(Slot, Immediate), OperandError>
{
  let shape = operation.shape();

  let slot_limit = match shape.has_slot() {
    true  => slot_limit(shape),
    false => 1
  };
  if slot < 0 || slot >= slot_limit as i64 {
    return Err(OperandError::SlotOutOfRange { operation, slot, limit: slot_limit });
  }

  let immediate_limit = match shape.has_immediate() {
    true  => immediate_limit(shape),
    false => 1
  };
  if immediate < 0 || immediate >= immediate_limit as i64 {
    return Err(OperandError::ValueOutOfRange { operation, value: immediate, limit: immediate_limit });
  }

  Ok((slot as Slot, immediate as Immediate))
}

/**
  Encodes the instruction into a machine word. Operands are range checked first; nothing is
  ever truncated to fit.
*/
pub fn encode_instruction(instruction: &Instruction) -> Result<Word, OperandError> {
  let operation = instruction.operation();
  let (slot, immediate) = instruction.fields();
  let (slot, immediate) = check_fields(operation, slot as i64, immediate as i64)?;

  let opcode = (operation.code() as Word) << OPCODE_SHIFT;
  let word =
    match operation.shape() {
      // [OpCode:8][Reserved:24]
      Shape::Nullary         => opcode,
      // [OpCode:8][Slot:5][Reserved:19]
      Shape::Slot            => opcode | ((slot as Word) << SLOT_SHIFT),
      // [OpCode:8][Slot:5][Immediate:19]
      Shape::SlotImmediate   => opcode | ((slot as Word) << SLOT_SHIFT) | immediate,
      // [OpCode:8][Slot:2][Address:22]
      Shape::SlotWideAddress => opcode | ((slot as Word) << WIDE_SLOT_SHIFT) | immediate,
      // [OpCode:8][Reserved:5][Address:19]
      Shape::Address         => opcode | immediate,
    };

  Ok(word)
}

fn mask(bits: u32) -> Word {
  (1 << bits) - 1
}

/**
  Decodes one machine word. Bits a shape does not use are ignored, so any word with a known
  opcode decodes; `reserved_bits` reports them for diagnostics.
*/
pub fn decode_word(word: Word) -> Result<Instruction, UnknownOpcode> {
  let code = (word >> OPCODE_SHIFT) as u8;
  let operation = Operation::try_from(code).map_err(|_| UnknownOpcode(code))?;

  let (slot, immediate) =
    match operation.shape() {
      Shape::SlotWideAddress => (
        (word >> WIDE_SLOT_SHIFT) & mask(WIDE_SLOT_BITS),
        word & mask(WIDE_ADDRESS_BITS)
      ),
      _ => (
        (word >> SLOT_SHIFT) & mask(SLOT_BITS),
        word & mask(IMMEDIATE_BITS)
      ),
    };

  Ok(Instruction::from_fields(operation, slot as Slot, immediate))
}

/// The bits of `word` that its opcode's shape leaves unused but that are set anyway.
pub fn reserved_bits(word: Word) -> Word {
  match decode_word(word) {
    Ok(instruction) => {
      match encode_instruction(&instruction) {
        Ok(canonical) => word ^ canonical,
        Err(_)        => 0
      }
    }
    Err(_) => 0
  }
}

/// Serializes words as big-endian bytes, four per word.
pub fn words_to_bytes(words: &[Word]) -> Vec<u8> {
  words.iter().flat_map(|word| word.to_be_bytes()).collect()
}

/**
  Splits big-endian bytes into words. Trailing bytes that do not make up a whole word are
  returned separately rather than treated as an error.
*/
pub fn bytes_to_words(bytes: &[u8]) -> (Vec<Word>, Option<TruncatedBinary>) {
  let chunks = bytes.chunks_exact(WORD_BYTES);
  let remainder = chunks.remainder();

  let truncated = match remainder.is_empty() {
    true  => None,
    false => Some(TruncatedBinary {
      offset   : bytes.len() - remainder.len(),
      trailing : remainder.to_vec()
    })
  };

  let words = chunks
    .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
    .collect();

  (words, truncated)
}
