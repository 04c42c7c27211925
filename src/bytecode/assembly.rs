/*!
  The human readable textual form of bytecode is called assembly. This module parses assembly
  one line at a time with `nom` and leverages the `strum` derives of `Operation` to resolve
  mnemonics.

  ```text
  ; Compare two constants.
  LOAD_CONSTANT 0 42
  LOAD_CONSTANT 0 17   ; trailing comments are allowed
  GREATER
  ```
*/

use nom::{
  branch::alt,
  bytes::complete::{tag, take_till1, take_while1},
  character::complete::{char as one_char, digit1, multispace0, multispace1, one_of},
  combinator::{all_consuming, eof, opt, recognize, rest},
  multi::many0,
  sequence::{pair, preceded, terminated, tuple},
  IResult
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bytecode::{encode_instruction, Instruction, Operation, Program, Word};
use crate::error::{AssemblyError, AssemblyErrorKind, OperandError};

pub const COMMENT_MARKER: char = ';';

/// One entry of the assembly log, in source order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRecord {
  /// Line number in the source, counting from 1.
  pub line        : usize,
  /// The source line, trimmed.
  pub instruction : String,
  /// The encoded word as 8 uppercase hex digits.
  pub binary      : String
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssembledLine {
  pub line        : usize,
  pub source      : String,
  pub instruction : Instruction,
  pub word        : Word
}

impl AssembledLine {
  pub fn record(&self) -> AssemblyRecord {
    AssemblyRecord {
      line        : self.line,
      instruction : self.source.clone(),
      binary      : format!("{:08X}", self.word)
    }
  }
}

/// The output of a successful assembly: the word stream and its parallel log.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Assembly {
  pub words : Vec<Word>,
  pub log   : Vec<AssemblyRecord>
}

impl Assembly {
  pub fn program(&self) -> Program {
    Program::new(self.words.clone())
  }
}

fn token(input: &str) -> IResult<&str, &str> {
  take_till1(|c: char| c.is_whitespace() || c == COMMENT_MARKER)(input)
}

/// A mnemonic is a word of letters, digits and underscores, or the symbol `>`.
fn mnemonic(input: &str) -> IResult<&str, &str> {
  alt((take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'), tag(">")))(input)
}

/// `mnemonic operand* (; comment)?`
fn statement(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
  terminated(
    pair(mnemonic, many0(preceded(multispace1, token))),
    tuple((multispace0, opt(preceded(one_char(COMMENT_MARKER), rest)), eof))
  )(input)
}

fn integer(input: &str) -> IResult<&str, &str> {
  all_consuming(recognize(pair(opt(one_of("+-")), digit1)))(input)
}

fn parse_operand(text: &str) -> Result<i64, OperandError> {
  integer(text)
    .ok()
    .and_then(|(_, digits)| digits.parse::<i64>().ok())
    .ok_or_else(|| OperandError::NotANumber(text.to_string()))
}

/**
  Assembles one source line. Returns `Ok(None)` for blank and comment lines.
*/
pub fn assemble_line(line: usize, text: &str) -> Result<Option<AssembledLine>, AssemblyError> {
  let source = text.trim();
  if source.is_empty() || source.starts_with(COMMENT_MARKER) {
    return Ok(None);
  }

  let error = |kind: AssemblyErrorKind| AssemblyError { line, kind };

  let (mnemonic, operand_text) = match statement(source) {
    Ok((_, parsed)) => parsed,
    Err(_)          => return Err(error(AssemblyErrorKind::Syntax(source.to_string())))
  };

  let operation = Operation::from_mnemonic(mnemonic).map_err(error)?;

  if operand_text.len() != operation.arity() {
    return Err(error(
      OperandError::WrongArity {
        operation,
        expected : operation.arity(),
        found    : operand_text.len()
      }.into()
    ));
  }

  let operands = operand_text
    .iter()
    .map(|text| parse_operand(text))
    .collect::<Result<Vec<i64>, OperandError>>()
    .map_err(|e| error(e.into()))?;

  let instruction = Instruction::from_operands(operation, &operands).map_err(|e| error(e.into()))?;
  let word = encode_instruction(&instruction).map_err(|e| error(e.into()))?;

  debug!(line, "{} -> {:08X}", source, word);

  Ok(Some(AssembledLine {
    line,
    source: source.to_string(),
    instruction,
    word
  }))
}

/**
  Lazily assembles `text` line by line. Every line is independent, so a caller that wants the
  output preceding a bad line can keep it; `assemble` stops at the first error instead.
*/
pub fn assemble_lines(text: &str) -> impl Iterator<Item = Result<AssembledLine, AssemblyError>> + '_ {
  text
    .lines()
    .enumerate()
    .filter_map(|(index, line)| assemble_line(index + 1, line).transpose())
}

/// Assembles `text`, failing on the first invalid line.
pub fn assemble(text: &str) -> Result<Assembly, AssemblyError> {
  let mut assembly = Assembly::default();

  for assembled in assemble_lines(text) {
    let assembled = assembled?;
    assembly.log.push(assembled.record());
    assembly.words.push(assembled.word);
  }

  Ok(assembly)
}


#[cfg(test)]
mod tests {
  use super::*;

  fn kind_of(text: &str) -> AssemblyErrorKind {
    assemble(text).unwrap_err().kind
  }

  #[test]
  fn stack_program(){
    let assembly = assemble("LOAD_CONSTANT 0 42\nLOAD_CONSTANT 0 17\nGREATER").unwrap();
    assert_eq!(assembly.words, vec![0x1B00_002A, 0x1B00_0011, 0x1500_0000]);
    assert_eq!(
      assembly.log[0],
      AssemblyRecord { line: 1, instruction: "LOAD_CONSTANT 0 42".to_string(), binary: "1B00002A".to_string() }
    );
    assert_eq!(assembly.log[2].binary, "15000000");
  }

  #[test]
  fn blank_lines_and_comments_are_skipped(){
    let text = "
; A comment
    LOAD_CONSTANT 1 5    ; trailing comment

\t  LOAD_MEMORY 1;no space
  >
";
    let assembly = assemble(text).unwrap();
    let lines: Vec<usize> = assembly.log.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![3, 5, 6]);
    assert_eq!(assembly.log[0].instruction, "LOAD_CONSTANT 1 5    ; trailing comment");
    assert_eq!(assembly.words[2], 0x1500_0000);
  }

  #[test]
  fn register_family(){
    let assembly = assemble("LOAD 3\nADD 4\nSUB 5\nSTORE 6\nJUMP 0\nHALT").unwrap();
    assert_eq!(
      assembly.words,
      vec![0x0100_0003, 0x0300_0004, 0x0400_0005, 0x0200_0006, 0x0500_0000, 0x0600_0000]
    );
  }

  #[test]
  fn unknown_instruction(){
    let error = assemble("LOAD_CONSTANT 0 1\nPUSH 4").unwrap_err();
    assert_eq!(error.line, 2);
    assert_eq!(error.kind, AssemblyErrorKind::UnknownInstruction("PUSH".to_string()));
  }

  #[test]
  fn wrong_arity(){
    assert_eq!(
      kind_of("LOAD_CONSTANT 0"),
      AssemblyErrorKind::InvalidOperand(
        OperandError::WrongArity { operation: Operation::LoadConstant, expected: 2, found: 1 }
      )
    );
    assert!(matches!(
      kind_of("GREATER 1"),
      AssemblyErrorKind::InvalidOperand(OperandError::WrongArity { .. })
    ));
  }

  #[test]
  fn operands_are_decimal(){
    assert_eq!(
      kind_of("LOAD_CONSTANT 0 0x10"),
      AssemblyErrorKind::InvalidOperand(OperandError::NotANumber("0x10".to_string()))
    );
    assert!(matches!(
      kind_of("LOAD_CONSTANT zero 1"),
      AssemblyErrorKind::InvalidOperand(OperandError::NotANumber(_))
    ));
  }

  #[test]
  fn out_of_range_operands(){
    assert!(matches!(
      kind_of("LOAD_CONSTANT 32 1"),
      AssemblyErrorKind::InvalidOperand(OperandError::SlotOutOfRange { slot: 32, .. })
    ));
    assert!(matches!(
      kind_of("LOAD_CONSTANT 0 524288"),
      AssemblyErrorKind::InvalidOperand(OperandError::ValueOutOfRange { value: 524288, .. })
    ));
    assert!(matches!(
      kind_of("LOAD_CONSTANT 0 -1"),
      AssemblyErrorKind::InvalidOperand(OperandError::ValueOutOfRange { value: -1, .. })
    ));
    assert!(matches!(
      kind_of("STORE_TO_MEMORY 0 4194304"),
      AssemblyErrorKind::InvalidOperand(OperandError::ValueOutOfRange { .. })
    ));
    assert!(assemble("LOAD_CONSTANT 31 524287").is_ok());
    assert!(assemble("STORE_TO_MEMORY 0 4194303").is_ok());
  }

  #[test]
  fn narrow_slot_is_explained(){
    let error = assemble("STORE_TO_MEMORY 31 10").unwrap_err();
    assert_eq!(
      error.kind,
      AssemblyErrorKind::InvalidOperand(
        OperandError::SlotOutOfRange { operation: Operation::StoreToMemory, slot: 31, limit: 4 }
      )
    );
    let message = error.to_string();
    assert!(message.contains("must be below 4"), "{}", message);
    assert!(message.contains("22-bit address"), "{}", message);

    let message = assemble("LOAD_CONSTANT 32 1").unwrap_err().to_string();
    assert!(message.ends_with("(must be below 32)"), "{}", message);
  }

  #[test]
  fn malformed_statements(){
    assert_eq!(
      kind_of("LOAD_CONSTANT, 0 1"),
      AssemblyErrorKind::Syntax("LOAD_CONSTANT, 0 1".to_string())
    );
    assert!(matches!(kind_of("PUSH! 1"), AssemblyErrorKind::Syntax(_)));
    assert!(matches!(kind_of("=> 1"), AssemblyErrorKind::Syntax(_)));
    // A comment may follow the mnemonic directly.
    assert!(matches!(kind_of("A;B"), AssemblyErrorKind::UnknownInstruction(_)));
    assert!(assemble(">;compare").is_ok());
  }

  #[test]
  fn lines_before_an_error_are_still_available(){
    let results: Vec<_> = assemble_lines("LOAD_CONSTANT 0 1\nLOAD_CONSTANT 0 2\nBOGUS\nHALT").collect();
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert_eq!(results[2].as_ref().unwrap_err().line, 3);
    assert!(results[3].is_ok());
  }

  #[test]
  fn log_serializes_as_records(){
    let assembly = assemble("HALT").unwrap();
    let json = serde_json::to_value(&assembly.log).unwrap();
    assert_eq!(json, serde_json::json!([{ "line": 1, "instruction": "HALT", "binary": "06000000" }]));
  }
}
