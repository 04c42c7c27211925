//! The virtual machine: fetches words from a `Program`, decodes them, and executes them
//! against a `MachineState` it owns.

use std::fmt::{Display, Formatter};

use prettytable::Table;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
#[cfg(feature = "trace_computation")]
use tracing::trace;

use crate::bytecode::*;
use crate::config::MachineConfig;
use crate::dump::TABLE_DISPLAY_FORMAT;
use crate::error::ExecutionError;
use crate::state::{MachineState, Value};

/// One entry of the execution trace, in execution order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
  /// Counts executed instructions from 0.
  pub step        : usize,
  pub pc          : usize,
  /// The instruction in assembly syntax, or the raw word if it could not be decoded.
  pub instruction : String,
  pub effect      : String
}

/// How a successful run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Termination {
  /// A `HALT` instruction was executed.
  Halted,
  /// The program counter moved past the last word, by falling through or by a `JUMP`.
  RanOffEnd
}

/// What the program counter does after an instruction.
enum Flow {
  Next,
  Jump(usize),
  Halt
}

pub struct Machine {
  state : MachineState,
  trace : Vec<ExecutionRecord>
}

impl Machine {

  // region Display methods

  fn make_cell_table<I> (
      name      : char,
      cells     : I,
      highlight : Option<usize>
    ) -> Table
    where I: Iterator<Item = (usize, Value)>
  {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, value) in cells {
      match Some(i) == highlight {

        true  => {
          table.add_row(row![r->format!("* --> {}[{}] =", name, i), value]);
        }

        false => {
          table.add_row(row![r->format!("{}[{}] =", name, i), value]);
        }

      } // end match on highlight
    } // end for
    table
  }

  // endregion

  pub fn new(config: MachineConfig) -> Machine {
    Machine {
      state : MachineState::new(&config),
      trace : vec![]
    }
  }

  pub fn state(&self) -> &MachineState {
    &self.state
  }

  pub fn trace(&self) -> &[ExecutionRecord] {
    &self.trace
  }

  pub fn into_parts(self) -> (Vec<ExecutionRecord>, MachineState) {
    (self.trace, self.state)
  }

  /**
    Runs `program` from its first word until `HALT`, until the program counter leaves the
    program, or until the first fatal error. Memory, stack and accumulator carry over from any
    previous run; the program counter restarts at 0.

    The trace is kept whatever the outcome. On error its last entry is the failing
    instruction.
  */
  pub fn execute(&mut self, program: &Program) -> Result<Termination, ExecutionError> {
    self.state.pc = 0;

    if let Some(truncation) = program.truncated() {
      warn!("executing a truncated program: {}", truncation);
    }

    loop {
      let pc = self.state.pc;
      let word = match program.word(pc) {
        Some(word) => word,
        None => {
          debug!(pc, "ran off the end of the program");
          return Ok(Termination::RanOffEnd);
        }
      };

      let instruction = match decode_word(word) {
        Ok(instruction) => instruction,
        Err(unknown) => {
          let error = ExecutionError::UnknownOpcode { pc, opcode: unknown.0 };
          self.record(pc, format!("{:08X}", word), format!("error: {}", error));
          return Err(error);
        }
      };

      if reserved_bits(word) != 0 {
        warn!(pc, "word {:08X} has reserved bits set: {:08X}", word, reserved_bits(word));
      }

      let outcome = self.dispatch(pc, instruction);

      #[cfg(feature = "trace_computation")] trace!("\n{}", self);

      match outcome {

        Ok((effect, flow)) => {
          debug!(pc, "{}: {}", instruction, effect);
          self.record(pc, instruction.to_string(), effect);

          match flow {
            Flow::Next           => self.state.pc += 1,
            Flow::Jump(target)   => self.state.pc = target,
            Flow::Halt           => return Ok(Termination::Halted),
          }
        }

        Err(error) => {
          self.record(pc, instruction.to_string(), format!("error: {}", error));
          return Err(error);
        }

      } // end match on outcome
    } // end loop
  }

  fn record(&mut self, pc: usize, instruction: String, effect: String) {
    let step = self.trace.len();
    self.trace.push(ExecutionRecord { step, pc, instruction, effect });
  }

  // region Stack and memory helpers

  /// Fails unless the stack holds at least `required` values.
  fn require(&self, pc: usize, operation: Operation, required: usize) -> Result<(), ExecutionError> {
    let available = self.state.stack.len();
    match available >= required {
      true  => Ok(()),
      false => Err(ExecutionError::StackUnderflow { pc, operation, required, available })
    }
  }

  fn pop(&mut self, pc: usize, operation: Operation) -> Result<Value, ExecutionError> {
    self.state.stack.pop().ok_or(
      ExecutionError::StackUnderflow { pc, operation, required: 1, available: 0 }
    )
  }

  fn push(&mut self, pc: usize, operation: Operation, value: Value) -> Result<(), ExecutionError> {
    let capacity = self.state.stack.capacity();
    self.state.stack.try_push(value).map_err(|_| {
      ExecutionError::StackOverflow { pc, operation, capacity }
    })
  }

  /// Checks `address` against the memory size and converts it to an index.
  fn index(&self, pc: usize, operation: Operation, address: Value) -> Result<usize, ExecutionError> {
    self.state.memory.index(address).ok_or(
      ExecutionError::InvalidAddress { pc, operation, address, size: self.state.memory.size() }
    )
  }

  fn read(&self, pc: usize, operation: Operation, address: Value) -> Result<(usize, Value), ExecutionError> {
    let index = self.index(pc, operation, address)?;
    let value = self.state.memory.get(index).unwrap_or_default();
    Ok((index, value))
  }

  fn write(&mut self, pc: usize, operation: Operation, address: Value, value: Value)
    -> Result<usize, ExecutionError>
  {
    let index = self.index(pc, operation, address)?;
    self.state.memory.set(index, value);
    Ok(index)
  }

  // endregion

  // region Instruction dispatch

  fn dispatch(&mut self, pc: usize, instruction: Instruction) -> Result<(String, Flow), ExecutionError> {
    let operation = instruction.operation();

    let effect =
      match instruction {

        Instruction::LoadConstant { value, .. } => {
          self.push(pc, operation, value as Value)?;
          format!("pushed {} onto the stack", value)
        }

        Instruction::LoadMemory { .. } => {
          self.require(pc, operation, 1)?;
          let address = self.pop(pc, operation)?;
          let (index, value) = self.read(pc, operation, address)?;
          self.push(pc, operation, value)?;
          format!("loaded {} from memory[{}]", value, index)
        }

        Instruction::StoreToMemory { .. } => {
          self.require(pc, operation, 2)?;
          let value   = self.pop(pc, operation)?;
          let address = self.pop(pc, operation)?;
          let index   = self.write(pc, operation, address, value)?;
          format!("stored {} to memory[{}]", value, index)
        }

        Instruction::Greater => {
          self.require(pc, operation, 2)?;
          let b = self.pop(pc, operation)?;
          let a = self.pop(pc, operation)?;
          let result = (a > b) as Value;
          self.push(pc, operation, result)?;
          format!("compared {} > {}, pushed {}", a, b, result)
        }

        Instruction::Load(address) => {
          let (index, value) = self.read(pc, operation, address as Value)?;
          self.state.accumulator = value;
          format!("accumulator <- memory[{}] = {}", index, value)
        }

        Instruction::Store(address) => {
          let value = self.state.accumulator;
          let index = self.write(pc, operation, address as Value, value)?;
          format!("memory[{}] <- accumulator = {}", index, value)
        }

        Instruction::Add(address) => {
          let (index, value) = self.read(pc, operation, address as Value)?;
          self.state.accumulator = self.state.accumulator
            .checked_add(value)
            .ok_or(ExecutionError::ArithmeticOverflow { pc, operation })?;
          format!("accumulator += memory[{}] ({}) -> {}", index, value, self.state.accumulator)
        }

        Instruction::Sub(address) => {
          let (index, value) = self.read(pc, operation, address as Value)?;
          self.state.accumulator = self.state.accumulator
            .checked_sub(value)
            .ok_or(ExecutionError::ArithmeticOverflow { pc, operation })?;
          format!("accumulator -= memory[{}] ({}) -> {}", index, value, self.state.accumulator)
        }

        Instruction::Jump(target) => {
          return Ok((format!("jumped to {}", target), Flow::Jump(target as usize)));
        }

        Instruction::Halt => {
          return Ok(("halted".to_string(), Flow::Halt));
        }

      }; // end match on instruction

    Ok((effect, Flow::Next))
  }

  // endregion
}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let stack = self.state.stack.as_slice();
    let s_table = Machine::make_cell_table(
      'S',
      stack.iter().copied().enumerate(),
      stack.len().checked_sub(1)
    );
    // Untouched memory is all zeros; only show the cells that hold something.
    let m_table = Machine::make_cell_table(
      'M',
      self.state.memory.cells().iter().copied().enumerate().filter(|(_, value)| *value != 0),
      None
    );

    let mut combined_table = table!([s_table, m_table]);

    combined_table.set_titles(row![ub->"Stack", ub->"Memory"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "PC: {}\tAccumulator: {}\n{}", self.state.pc, self.state.accumulator, combined_table)
  }
}

/// Everything a run produces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Execution {
  pub trace   : Vec<ExecutionRecord>,
  pub state   : MachineState,
  pub outcome : Result<Termination, ExecutionError>
}

/// Runs `program` on a fresh machine.
pub fn execute(program: &Program, config: MachineConfig) -> Execution {
  let mut machine = Machine::new(config);
  let outcome = machine.execute(program);
  let (trace, state) = machine.into_parts();

  Execution { trace, state, outcome }
}
