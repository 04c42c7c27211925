//! A program is the word stream the machine executes, in execution order.

use tracing::warn;

use super::{bytes_to_words, decode_word, encode_instruction, words_to_bytes, Instruction, Word};
use crate::error::{OperandError, TruncatedBinary, UnknownOpcode};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
  words     : Vec<Word>,
  truncated : Option<TruncatedBinary>
}

impl Program {

  pub fn new(words: Vec<Word>) -> Program {
    Program { words, truncated: None }
  }

  /// Encodes each instruction in order.
  pub fn from_instructions(instructions: &[Instruction]) -> Result<Program, OperandError> {
    let words = instructions
      .iter()
      .map(encode_instruction)
      .collect::<Result<Vec<Word>, OperandError>>()?;
    Ok(Program::new(words))
  }

  /**
    Loads a program from big-endian bytes. A trailing partial word is dropped with a warning
    and kept available through `truncated()`; loading itself never fails. Opcodes are not
    checked here, the machine decodes each word when it fetches it.
  */
  pub fn from_bytes(bytes: &[u8]) -> Program {
    let (words, truncated) = bytes_to_words(bytes);
    if let Some(truncation) = &truncated {
      warn!("{}; skipping it", truncation);
    }
    Program { words, truncated }
  }

  pub fn to_bytes(&self) -> Vec<u8> {
    words_to_bytes(&self.words)
  }

  pub fn words(&self) -> &[Word] {
    &self.words
  }

  pub fn word(&self, pc: usize) -> Option<Word> {
    self.words.get(pc).copied()
  }

  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn truncated(&self) -> Option<&TruncatedBinary> {
    self.truncated.as_ref()
  }

  /// Decodes every word, failing on the first unknown opcode.
  pub fn decode_all(&self) -> Result<Vec<Instruction>, UnknownOpcode> {
    self.words.iter().map(|word| decode_word(*word)).collect()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use proptest::prelude::*;

  #[test]
  fn truncated_binary_keeps_whole_words(){
    // One LOAD_CONSTANT followed by a single stray byte.
    let program = Program::from_bytes(&[0x1B, 0x00, 0x00, 0x2A, 0x15]);
    assert_eq!(program.len(), 1);
    assert_eq!(program.decode_all(), Ok(vec![Instruction::LoadConstant { slot: 0, value: 42 }]));
    let truncation = program.truncated().unwrap();
    assert_eq!(truncation.offset, 4);
    assert_eq!(truncation.trailing, vec![0x15]);
  }

  #[test]
  fn unknown_opcode_surfaces_on_decode(){
    let program = Program::new(vec![0x0600_0000, 0x6300_0000]);
    assert_eq!(program.decode_all(), Err(UnknownOpcode(0x63)));
  }

  #[test]
  fn from_instructions_rejects_bad_operands(){
    let result = Program::from_instructions(&[Instruction::Halt, Instruction::LoadMemory { slot: 40 }]);
    assert!(result.is_err());
  }

  proptest! {
    #[test]
    fn every_instruction_survives_a_round_trip(
      values in proptest::collection::vec(0u32..(1 << 19), 0..32)
    ) {
      let instructions: Vec<Instruction> = values
        .iter()
        .map(|&value| Instruction::LoadConstant { slot: (value % 32) as u8, value })
        .collect();
      let program = Program::from_instructions(&instructions).unwrap();
      let reloaded = Program::from_bytes(&program.to_bytes());

      prop_assert_eq!(reloaded.len(), instructions.len());
      prop_assert_eq!(reloaded.decode_all(), Ok(instructions));
    }
  }
}
