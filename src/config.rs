//! Resource limits of a machine instance.

pub const DEFAULT_MEMORY_SIZE    : usize = 1024;
pub const DEFAULT_STACK_CAPACITY : usize = 256;

/// Memory and the operand stack are both fixed size; neither ever grows past these limits.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MachineConfig {
  /// Number of memory cells, addressed `0..memory_size`.
  pub memory_size    : usize,
  /// Maximum depth of the operand stack.
  pub stack_capacity : usize
}

impl MachineConfig {
  pub fn with_memory_size(self, memory_size: usize) -> MachineConfig {
    MachineConfig { memory_size, ..self }
  }

  pub fn with_stack_capacity(self, stack_capacity: usize) -> MachineConfig {
    MachineConfig { stack_capacity, ..self }
  }
}

impl Default for MachineConfig {
  fn default() -> MachineConfig {
    MachineConfig {
      memory_size    : DEFAULT_MEMORY_SIZE,
      stack_capacity : DEFAULT_STACK_CAPACITY
    }
  }
}
