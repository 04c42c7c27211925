//! The execution state owned by a single machine: operand stack, memory, accumulator and
//! program counter.

use std::ops::RangeInclusive;

use crate::config::MachineConfig;
use crate::dump::MemoryDump;
use crate::error::{Error, Result};

/// Stack entries, memory cells and the accumulator are all signed.
pub type Value = i64;

/// A last-in-first-out stack with a fixed capacity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperandStack {
  values   : Vec<Value>,
  capacity : usize
}

impl OperandStack {
  pub fn new(capacity: usize) -> OperandStack {
    OperandStack {
      values: Vec::with_capacity(capacity),
      capacity
    }
  }

  /// Pushes `value`, or hands it back if the stack is full.
  pub fn try_push(&mut self, value: Value) -> std::result::Result<(), Value> {
    if self.values.len() >= self.capacity {
      return Err(value);
    }
    self.values.push(value);
    Ok(())
  }

  pub fn pop(&mut self) -> Option<Value> {
    self.values.pop()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bottom of the stack first.
  pub fn as_slice(&self) -> &[Value] {
    &self.values
  }
}

/// Zero-initialized, fixed size, word addressed memory.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
  cells: Vec<Value>
}

impl Memory {
  pub fn new(size: usize) -> Memory {
    Memory { cells: vec![0; size] }
  }

  pub fn size(&self) -> usize {
    self.cells.len()
  }

  /// Converts `address` to an index if it lies within `[0, size)`.
  pub fn index(&self, address: Value) -> Option<usize> {
    usize::try_from(address).ok().filter(|index| *index < self.cells.len())
  }

  pub fn get(&self, index: usize) -> Option<Value> {
    self.cells.get(index).copied()
  }

  pub fn set(&mut self, index: usize, value: Value) -> Option<()> {
    self.cells.get_mut(index).map(|cell| *cell = value)
  }

  pub fn cells(&self) -> &[Value] {
    &self.cells
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineState {
  pub stack       : OperandStack,
  pub memory      : Memory,
  pub accumulator : Value,
  pub pc          : usize
}

impl MachineState {
  pub fn new(config: &MachineConfig) -> MachineState {
    MachineState {
      stack       : OperandStack::new(config.stack_capacity),
      memory      : Memory::new(config.memory_size),
      accumulator : 0,
      pc          : 0
    }
  }

  /// Snapshot of every memory cell, untouched zero cells included.
  pub fn dump_all(&self) -> MemoryDump {
    MemoryDump::new(0, self.memory.cells().to_vec())
  }

  /// Snapshot of the inclusive address range `range`.
  pub fn dump(&self, range: RangeInclusive<usize>) -> Result<MemoryDump> {
    check_dump_range(&range, self.memory.size())?;
    let (start, end) = (*range.start(), *range.end());

    Ok(MemoryDump::new(start, self.memory.cells()[start..=end].to_vec()))
  }
}

/// A dump range must be non-empty and lie inside a memory of `size` cells.
pub fn check_dump_range(range: &RangeInclusive<usize>, size: usize) -> Result<()> {
  let (start, end) = (*range.start(), *range.end());
  if start > end || end >= size {
    return Err(Error::InvalidDumpRange { start, end, size });
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stack_is_bounded(){
    let mut stack = OperandStack::new(2);
    assert_eq!(stack.try_push(1), Ok(()));
    assert_eq!(stack.try_push(2), Ok(()));
    assert_eq!(stack.try_push(3), Err(3));
    assert_eq!(stack.as_slice(), &[1, 2]);
    assert_eq!(stack.pop(), Some(2));
    assert_eq!(stack.len(), 1);
    assert_eq!(stack.pop(), Some(1));
    assert_eq!(stack.pop(), None);
  }

  #[test]
  fn memory_addresses(){
    let mut memory = Memory::new(4);
    assert_eq!(memory.index(0), Some(0));
    assert_eq!(memory.index(3), Some(3));
    assert_eq!(memory.index(4), None);
    assert_eq!(memory.index(-1), None);
    assert_eq!(memory.set(2, 9), Some(()));
    assert_eq!(memory.set(4, 9), None);
    assert_eq!(memory.cells(), &[0, 0, 9, 0]);
  }

  #[test]
  fn dump_ranges(){
    let mut state = MachineState::new(&MachineConfig::default().with_memory_size(8));
    state.memory.set(3, 30);
    state.memory.set(4, 40);

    let dump = state.dump(3..=5).unwrap();
    assert_eq!(dump.get(3), Some(30));
    assert_eq!(dump.get(5), Some(0));
    assert_eq!(dump.get(6), None);
    assert_eq!(dump.len(), 3);

    assert_eq!(state.dump_all().len(), 8);
    assert!(state.dump(0..=7).is_ok());
    assert!(matches!(state.dump(0..=8), Err(Error::InvalidDumpRange { start: 0, end: 8, size: 8 })));
    assert!(matches!(state.dump(5..=4), Err(Error::InvalidDumpRange { .. })));
  }

  #[test]
  fn dump_range_checked_without_a_machine(){
    assert!(check_dump_range(&(0..=1023), 1024).is_ok());
    assert!(matches!(
      check_dump_range(&(0..=1024), 1024),
      Err(Error::InvalidDumpRange { start: 0, end: 1024, size: 1024 })
    ));
    assert!(check_dump_range(&(2..=1), 1024).is_err());
  }
}
